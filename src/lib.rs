/// 内部导出的模块
mod internal;


/// 核心入口：分片下载器与进度、断点、进行中下载表
pub mod download {
    use crate::internal;
    pub use internal::blob_download::structs::*;
}

/// registry 协作方：认证、请求模型、HTTP 客户端，测试或应用可以自行实现 `RegistryClient`
pub mod registry {
    use crate::internal;
    pub use internal::registry::structs::*;
    pub use internal::registry::traits::*;
}

pub mod store {
    use crate::internal;
    pub use internal::store::structs::*;
    pub use internal::store::structs::blob_store::BLOB_STORE_ENV;
}

pub mod states {
    pub mod unlock_reactive {
        use crate::internal;
        pub use internal::states::unlock_reactive::*;
    }
}

pub mod logging {
    use crate::internal;
    pub use internal::logging::*;
}
