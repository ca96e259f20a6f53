// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

mod common;

#[cfg(test)]
mod integration_tests {
    //! # 别名服务端到端测试
    //!
    //! 在真实套接字上验证别名改写与传输层的配合：
    //! 别名和直接路径返回同一份内容，查询串保留，未命中按普通路径处理。

    use super::common::TestServer;

    const A_MP4: &[u8] = b"0123456789abcdef";
    const B_MKV: &[u8] = b"matroska-bytes";

    async fn media_server() -> TestServer {
        TestServer::start(&[
            ("clips/a.mp4", A_MP4),
            ("clips/sub/b.mkv", B_MKV),
            ("notes.txt", b"not media"),
        ])
        .await
    }

    #[tokio::test]
    async fn test_alias_table_matches_scan_order() {
        let server = media_server().await;
        let pairs: Vec<(&str, &str)> = server
            .table
            .iter()
            .map(|a| (a.key(), a.relative_path()))
            .collect();
        assert_eq!(
            pairs,
            vec![("/1.mp4", "clips/a.mp4"), ("/2.mkv", "clips/sub/b.mkv")]
        );
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_get_alias_serves_mapped_file() {
        let server = media_server().await;

        let response = server.get("/1.mp4").await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body, A_MP4);
        assert_eq!(response.header("Content-Type"), Some("video/mp4"));
        assert_eq!(response.header("Content-Length"), Some("16"));
        assert_eq!(response.header("Accept-Ranges"), Some("bytes"));

        let response = server.get("/2.mkv").await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body, B_MKV);
        assert_eq!(response.header("Content-Type"), Some("video/x-matroska"));

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_alias_and_direct_path_are_identical() {
        let server = media_server().await;
        let via_alias = server.get("/2.mkv").await;
        let direct = server.get("/clips/sub/b.mkv").await;
        assert_eq!(via_alias.status, direct.status);
        assert_eq!(via_alias.body, direct.body);
        assert_eq!(via_alias.header("Content-Type"), direct.header("Content-Type"));
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_alias_keeps_query_string() {
        let server = media_server().await;
        let response = server.get("/1.mp4?t=30&autoplay=1").await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body, A_MP4);
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_percent_encoded_alias_is_matched() {
        let server = media_server().await;
        let response = server.get("/%31.mp4").await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body, A_MP4);
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_head_alias_has_headers_only() {
        let server = media_server().await;
        let response = server
            .request("HEAD /1.mp4 HTTP/1.1\r\nHost: test\r\n\r\n")
            .await;
        assert_eq!(response.status, 200);
        assert_eq!(response.header("Content-Length"), Some("16"));
        assert!(response.body.is_empty());
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_unmapped_alias_falls_through_to_404() {
        let server = media_server().await;
        assert_eq!(server.get("/3.mp4").await.status, 404);
        assert_eq!(server.get("/1.mkv").await.status, 404);
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_non_media_file_is_served_directly_but_not_aliased() {
        let server = media_server().await;
        let response = server.get("/notes.txt").await;
        assert_eq!(response.status, 200);
        assert_eq!(response.text(), "not media");
        assert_eq!(server.get("/3.txt").await.status, 404);
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_range_request_on_alias() {
        let server = media_server().await;
        let response = server
            .request("GET /1.mp4 HTTP/1.1\r\nRange: bytes=2-5\r\n\r\n")
            .await;
        assert_eq!(response.status, 206);
        assert_eq!(response.body, b"2345");
        assert_eq!(response.header("Content-Range"), Some("bytes 2-5/16"));
        assert_eq!(response.header("Content-Length"), Some("4"));
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_suffix_and_open_ranges() {
        let server = media_server().await;

        let response = server
            .request("GET /1.mp4 HTTP/1.1\r\nRange: bytes=-3\r\n\r\n")
            .await;
        assert_eq!(response.status, 206);
        assert_eq!(response.body, b"def");

        let response = server
            .request("GET /1.mp4 HTTP/1.1\r\nRange: bytes=10-\r\n\r\n")
            .await;
        assert_eq!(response.status, 206);
        assert_eq!(response.body, b"abcdef");
        assert_eq!(response.header("Content-Range"), Some("bytes 10-15/16"));

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_unsatisfiable_range() {
        let server = media_server().await;
        let response = server
            .request("GET /1.mp4 HTTP/1.1\r\nRange: bytes=100-\r\n\r\n")
            .await;
        assert_eq!(response.status, 416);
        assert_eq!(response.header("Content-Range"), Some("bytes */16"));
        assert!(response.body.is_empty());
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_reversed_range_serves_whole_file() {
        let server = media_server().await;
        let response = server
            .request("GET /1.mp4 HTTP/1.1\r\nRange: bytes=5-3\r\n\r\n")
            .await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body, A_MP4);
        assert_eq!(response.header("Content-Range"), None);
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_file_names_with_spaces_and_uppercase_extension() {
        let server = TestServer::start(&[
            ("My Clip.MP4", b"upper"),
            ("z/long name.mkv", b"spaced"),
        ])
        .await;

        let response = server.get("/1.mp4").await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"upper");

        let response = server.get("/2.mkv").await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"spaced");

        let response = server.get("/z/long%20name.mkv").await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"spaced");

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_large_file_is_streamed_in_chunks() {
        let content: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        let server = TestServer::start_with_config(
            &[("big.mp4", &content)],
            "streaming_threshold = 1024\nchunk_size = 4096\n",
        )
        .await;

        let response = server.get("/1.mp4").await;
        assert_eq!(response.status, 200);
        assert_eq!(response.header("Content-Length"), Some("100000"));
        assert_eq!(response.body, content);

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_configured_extensions() {
        let server = TestServer::start_with_config(
            &[("a.mp4", b"video"), ("b.vtt", b"WEBVTT")],
            "extensions = [\".VTT\"]\n",
        )
        .await;

        let response = server.get("/1.vtt").await;
        assert_eq!(response.status, 200);
        assert_eq!(response.text(), "WEBVTT");
        assert_eq!(server.get("/1.mp4").await.status, 404);

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_options_and_post() {
        let server = media_server().await;

        let response = server
            .request("OPTIONS /1.mp4 HTTP/1.1\r\n\r\n")
            .await;
        assert_eq!(response.status, 204);
        assert_eq!(response.header("Allow"), Some("GET, HEAD, OPTIONS"));

        let response = server.request("POST /1.mp4 HTTP/1.1\r\n\r\n").await;
        assert_eq!(response.status, 405);
        assert_eq!(response.header("Allow"), Some("GET, HEAD, OPTIONS"));

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_common_headers() {
        let server = media_server().await;
        let response = server.get("/1.mp4").await;
        assert_eq!(response.header("Connection"), Some("close"));
        assert!(response.header("Date").unwrap().ends_with("GMT"));
        assert!(response.header("Server").is_some());
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_http_1_0_is_echoed() {
        let server = media_server().await;
        let response = server.request("GET /1.mp4 HTTP/1.0\r\n\r\n").await;
        assert_eq!(response.status, 200);
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_concurrent_clients() {
        let server = media_server().await;
        let mut handles = Vec::new();
        for i in 0..16 {
            let addr = server.addr;
            handles.push(tokio::spawn(async move {
                use tokio::io::{AsyncReadExt, AsyncWriteExt};
                let target = if i % 2 == 0 { "/1.mp4" } else { "/2.mkv" };
                let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
                stream
                    .write_all(format!("GET {} HTTP/1.1\r\n\r\n", target).as_bytes())
                    .await
                    .unwrap();
                let mut buffer = Vec::new();
                stream.read_to_end(&mut buffer).await.unwrap();
                super::common::RawResponse::parse(&buffer)
            }));
        }
        for (i, handle) in handles.into_iter().enumerate() {
            let response = handle.await.unwrap();
            assert_eq!(response.status, 200);
            let expected = if i % 2 == 0 { A_MP4 } else { B_MKV };
            assert_eq!(response.body, expected);
        }
        server.shutdown().await;
    }
}
