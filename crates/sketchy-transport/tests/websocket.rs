//! Integration tests for the WebSocket transport.
//!
//! A real listener on an OS-assigned port and a real `tokio-tungstenite`
//! client, so frames actually cross a socket.

#[cfg(feature = "websocket")]
mod websocket {
    use futures_util::{SinkExt, StreamExt};
    use sketchy_transport::{Transport, WebSocketTransport};
    use tokio_tungstenite::tungstenite::Message;

    type ClientWs = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    async fn bind() -> (WebSocketTransport, String) {
        let transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("local addr").to_string();
        (transport, addr)
    }

    async fn connect_client(addr: &str) -> ClientWs {
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("client should connect");
        ws
    }

    #[tokio::test]
    async fn test_websocket_accept_and_exchange_text() {
        let (mut transport, addr) = bind().await;
        let server = tokio::spawn(async move { transport.accept().await.expect("accept") });

        let mut client = connect_client(&addr).await;
        let conn = server.await.expect("task should complete");
        assert!(conn.id().into_inner() > 0);

        let (mut writer, mut reader) = conn.split();
        assert_eq!(writer.id(), reader.id());

        writer.send_text("hello from server").await.expect("send");
        let msg = client.next().await.unwrap().unwrap();
        assert_eq!(msg.into_text().unwrap().as_str(), "hello from server");

        client
            .send(Message::Text("hello from client".into()))
            .await
            .unwrap();
        let received = reader.recv().await.expect("recv").expect("data");
        assert_eq!(received, "hello from client");
    }

    #[tokio::test]
    async fn test_websocket_binary_utf8_frame_is_read_as_text() {
        let (mut transport, addr) = bind().await;
        let server = tokio::spawn(async move { transport.accept().await.expect("accept") });

        let mut client = connect_client(&addr).await;
        let (_writer, mut reader) = server.await.unwrap().split();

        client
            .send(Message::Binary(b"{\"type\":\"chat\"}".to_vec().into()))
            .await
            .unwrap();
        let received = reader.recv().await.expect("recv").expect("data");
        assert_eq!(received, "{\"type\":\"chat\"}");
    }

    #[tokio::test]
    async fn test_websocket_recv_returns_none_on_client_close() {
        let (mut transport, addr) = bind().await;
        let server = tokio::spawn(async move { transport.accept().await.expect("accept") });

        let mut client = connect_client(&addr).await;
        let (_writer, mut reader) = server.await.unwrap().split();

        client.send(Message::Close(None)).await.unwrap();

        let result = reader.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_websocket_connection_ids_are_unique() {
        let (mut transport, addr) = bind().await;
        let server = tokio::spawn(async move {
            let a = transport.accept().await.expect("accept a");
            let b = transport.accept().await.expect("accept b");
            (a.id(), b.id())
        });

        let _c1 = connect_client(&addr).await;
        let _c2 = connect_client(&addr).await;
        let (a, b) = server.await.unwrap();
        assert_ne!(a, b);
    }
}
