//! HTTP 客户端：本地 TCP 上的最小 Range 服务器 + 真实 reqwest 客户端，验证认证头与分片下载；
//! 以及认证信息、请求 / 响应模型的基础行为。

use std::sync::{Arc, Mutex};

use reqwest::StatusCode;
use reqwest::header::{CONTENT_LENGTH, HeaderMap, HeaderValue, RANGE};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::download::{BlobDownloader, DownloadOptions, InProgressRegistry};
use crate::registry::{BlobSource, HttpRegistryClient, RegistryAuth, RegistryRequest, RegistryResponse};
use crate::store::Digest;
use crate::tests::{EventLog, digest_of, parse_range, sample_blob, temp_store};

/// 启动一个只认 HEAD / GET + Range 的服务器，返回根地址与收到的 Authorization 头
async fn spawn_range_server(blob: Vec<u8>) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let blob = Arc::new(blob);

    let seen_task = Arc::clone(&seen);
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let blob = Arc::clone(&blob);
            let seen = Arc::clone(&seen_task);
            tokio::spawn(async move {
                let _ = serve(stream, &blob, &seen).await;
            });
        }
    });

    (format!("http://{addr}"), seen)
}

async fn serve(mut stream: TcpStream, blob: &[u8], seen: &Mutex<Vec<String>>) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let head = String::from_utf8_lossy(&buf).to_string();
    let mut lines = head.lines();
    let method = lines
        .next()
        .and_then(|l| l.split_whitespace().next())
        .unwrap_or_default()
        .to_string();
    let mut range = None;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            match name.trim().to_ascii_lowercase().as_str() {
                "range" => range = Some(value.trim().to_string()),
                "authorization" => seen.lock().unwrap().push(value.trim().to_string()),
                _ => {}
            }
        }
    }

    let total = blob.len();
    let (status, body, extra) = match range.as_deref().and_then(parse_range) {
        Some((start, end)) => {
            let start = start as usize;
            let end = (end as usize + 1).min(total);
            (
                "206 Partial Content",
                &blob[start..end],
                format!("Content-Range: bytes {}-{}/{}\r\n", start, end - 1, total),
            )
        }
        None => ("200 OK", blob, String::new()),
    };

    let header = format!(
        "HTTP/1.1 {status}\r\nContent-Length: {}\r\n{extra}Connection: close\r\n\r\n",
        body.len()
    );
    stream.write_all(header.as_bytes()).await?;
    if method != "HEAD" {
        stream.write_all(body).await?;
    }
    stream.shutdown().await
}

/// 直连本地服务器，不走环境变量里的代理
fn local_client(auth: RegistryAuth) -> HttpRegistryClient {
    let client = reqwest::Client::builder()
        .no_proxy()
        .no_gzip()
        .build()
        .unwrap();
    HttpRegistryClient::with_client(client, auth)
}

#[tokio::test]
async fn http_client_downloads_parts_with_auth_header() {
    let data = sample_blob(5000);
    let digest = digest_of(&data);
    let (base, seen) = spawn_range_server(data.clone()).await;
    let (_dir, store) = temp_store();

    let client = Arc::new(local_client(RegistryAuth::bearer("secret-token").unwrap()));
    let downloader = BlobDownloader::new(client, store.clone(), InProgressRegistry::new())
        .part_size(1024)
        .max_concurrent_parts(2);

    let log = EventLog::default();
    let source = BlobSource::new(&base, "library/test").unwrap();
    downloader
        .download_blob(&digest, &source, log.options())
        .await
        .unwrap();

    let on_disk = std::fs::read(store.blob_path(&Digest::parse(&digest).unwrap())).unwrap();
    assert_eq!(on_disk, data);
    assert_eq!(log.last().map(|e| e.completed), Some(5000));

    let seen = seen.lock().unwrap().clone();
    // 1 次 HEAD + 5 个分片
    assert_eq!(seen.len(), 6);
    assert!(seen.iter().all(|v| v == "Bearer secret-token"));
}

#[tokio::test]
async fn anonymous_client_sends_no_authorization() {
    let data = sample_blob(100);
    let digest = digest_of(&data);
    let (base, seen) = spawn_range_server(data.clone()).await;
    let (_dir, store) = temp_store();

    let client = Arc::new(local_client(RegistryAuth::anonymous()));
    BlobDownloader::new(client, store, InProgressRegistry::new())
        .download_blob(
            &digest,
            &BlobSource::new(&base, "a/b").unwrap(),
            DownloadOptions::new(),
        )
        .await
        .unwrap();

    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn auth_headers_and_redaction() {
    let basic = RegistryAuth::basic("user", "pass").unwrap();
    assert_eq!(
        basic.authorization().unwrap().to_str().unwrap(),
        "Basic dXNlcjpwYXNz"
    );
    assert!(basic.authorization().unwrap().is_sensitive());
    assert!(!format!("{basic:?}").contains("dXNlcjpwYXNz"));

    assert!(RegistryAuth::anonymous().is_anonymous());
    assert!(RegistryAuth::anonymous().authorization().is_none());
    assert!(RegistryAuth::bearer("").is_err());

    assert_eq!(RegistryAuth::bearer("t").unwrap(), RegistryAuth::bearer("t").unwrap());
    assert_ne!(RegistryAuth::bearer("t").unwrap(), RegistryAuth::bearer("u").unwrap());
    assert_ne!(RegistryAuth::anonymous(), RegistryAuth::bearer("t").unwrap());
}

#[test]
fn request_and_response_helpers() {
    let url = url::Url::parse("http://registry.test/v2/a/blobs/sha256:00").unwrap();
    let request =
        RegistryRequest::get(url.clone()).with_header(RANGE, HeaderValue::from_static("bytes=0-9"));
    assert_eq!(request.range(), Some("bytes=0-9"));
    assert_eq!(RegistryRequest::head(url).range(), None);

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_LENGTH, HeaderValue::from_static("42"));
    let response = RegistryResponse::from_chunks(StatusCode::OK, headers, Vec::new());
    assert_eq!(response.content_length(), Some(42));

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_LENGTH, HeaderValue::from_static("lots"));
    let response = RegistryResponse::from_chunks(StatusCode::OK, headers, Vec::new());
    assert_eq!(response.content_length(), None);
    assert_eq!(RegistryResponse::empty(StatusCode::OK).content_length(), None);
}
