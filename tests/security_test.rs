// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

mod common;

#[cfg(test)]
mod security_tests {
    //! # 安全回归测试
    //!
    //! 覆盖范围：
    //! - 路径遍历（明文、百分号编码、借道别名）
    //! - 畸形报文与超大头部
    //! - 慢速连接不影响其他客户端

    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    use super::common::TestServer;

    async fn server() -> TestServer {
        TestServer::start(&[
            ("clips/a.mp4", b"video"),
            (".private/hidden.mp4", b"hidden"),
            (".secret.mp4", b"secret"),
        ])
        .await
    }

    #[tokio::test]
    async fn test_path_traversal_is_rejected() {
        let server = server().await;
        for target in [
            "/../etc/passwd",
            "/clips/../../etc/passwd",
            "/%2e%2e/%2e%2e/etc/passwd",
            "/clips/%2E%2E/%2E%2E/etc/passwd",
            "/clips/..%2f..%2fetc/passwd",
        ] {
            let response = server.get(target).await;
            assert_eq!(response.status, 400, "target: {}", target);
        }
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_traversal_through_alias_prefix() {
        let server = server().await;
        let response = server.get("/1.mp4/../../etc/passwd").await;
        assert_eq!(response.status, 400);
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_null_byte_is_rejected() {
        let server = server().await;
        assert_eq!(server.get("/clips/a.mp4%00.txt").await.status, 400);
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_hidden_entries_are_not_aliased() {
        let server = server().await;
        assert_eq!(server.table.len(), 1);
        assert_eq!(server.table.resolve("/1.mp4"), Some("clips/a.mp4"));
        assert_eq!(server.get("/2.mp4").await.status, 404);
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_malformed_request_line() {
        let server = server().await;
        assert_eq!(server.request("GARBAGE\r\n\r\n").await.status, 400);
        assert_eq!(server.request("GET\r\n\r\n").await.status, 400);
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_unsupported_method_and_version() {
        let server = server().await;
        assert_eq!(server.request("DELETE /1.mp4 HTTP/1.1\r\n\r\n").await.status, 405);
        assert_eq!(server.request("GET /1.mp4 HTTP/2.0\r\n\r\n").await.status, 505);
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_non_utf8_request() {
        let server = server().await;
        let response = server
            .request_bytes(b"GET /\xff\xfe.mp4 HTTP/1.1\r\n\r\n")
            .await;
        assert_eq!(response.status, 400);
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_oversized_head_is_rejected() {
        let server = server().await;
        // 超过上限一个字节，且没有头部结束标记
        let mut raw = b"GET /1.mp4 HTTP/1.1\r\nX-Pad: ".to_vec();
        raw.resize(16 * 1024 + 1, b'a');

        let response = server.request_bytes(&raw).await;
        assert_eq!(response.status, 413);
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_empty_connection_is_ignored() {
        let server = server().await;
        let mut stream = TcpStream::connect(server.addr).await.unwrap();
        stream.shutdown().await.unwrap();
        let mut buffer = Vec::new();
        tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut buffer))
            .await
            .unwrap()
            .unwrap();
        assert!(buffer.is_empty());

        assert_eq!(server.get("/1.mp4").await.status, 200);
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_slow_client_does_not_block_others() {
        let server = server().await;

        let mut slow = TcpStream::connect(server.addr).await.unwrap();
        slow.write_all(b"GET /1.mp4 HTTP/1.1\r\nHost: sl").await.unwrap();

        let response = server.get("/1.mp4").await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"video");

        slow.write_all(b"ow\r\n\r\n").await.unwrap();
        let mut buffer = Vec::new();
        tokio::time::timeout(Duration::from_secs(5), slow.read_to_end(&mut buffer))
            .await
            .unwrap()
            .unwrap();
        assert!(buffer.starts_with(b"HTTP/1.1 200 OK"));

        server.shutdown().await;
    }
}
