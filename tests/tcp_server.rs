use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::oneshot;

use vetclix::Permission;
use vetclix::auth::{CredentialTable, UserEntry};
use vetclix::protocol::Dispatcher;
use vetclix::server;
use vetclix::store::MemoryStore;

struct Connection {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Connection {
    async fn open(addr: std::net::SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, writer) = stream.into_split();
        Self {
            lines: BufReader::new(reader).lines(),
            writer,
        }
    }

    async fn send(&mut self, request: &str) -> String {
        self.send_bytes(request.as_bytes()).await
    }

    async fn send_bytes(&mut self, request: &[u8]) -> String {
        self.writer.write_all(request).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
        self.lines.next_line().await.unwrap().unwrap()
    }
}

#[tokio::test]
async fn connections_hold_independent_permissions() {
    let store = Arc::new(MemoryStore::new());
    let credentials = CredentialTable::new([
        UserEntry::with_password("bob", "right", Permission::Write),
        UserEntry::with_password("eve", "peek", Permission::Read),
    ]);
    let dispatcher = Arc::new(Dispatcher::new(store.clone(), store, Arc::new(credentials)));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(server::serve(listener, dispatcher, 1024, async move {
        let _ = stopped.await;
    }));

    let mut writer = Connection::open(addr).await;
    let mut reader = Connection::open(addr).await;

    assert_eq!(writer.send(r#"("version?")"#).await, "1");
    assert_eq!(writer.send(r#"("auth" "bob" "right")"#).await, "(2)");
    assert_eq!(
        reader.send(r#"("get" "client" "c-1")"#).await,
        r#"("error" "badauth")"#
    );

    let client = r#"("client" "c-1" "Bob Jones" "12 Elm Street" () () ())"#;
    assert_eq!(
        writer.send(&format!("(\"set-client\" {client})")).await,
        r#"("ok")"#
    );

    assert_eq!(reader.send(r#"("auth" "eve" "peek")"#).await, "(1)");
    assert_eq!(reader.send(r#"("get" "client" "c-1")"#).await, client);
    assert_eq!(
        reader.send(&format!("(\"set-client\" {client})")).await,
        r#"("error" "badauth")"#
    );

    // A failed login on one connection leaves the other untouched.
    assert_eq!(reader.send(r#"("auth" "eve" "wrong")"#).await, "(0)");
    assert_eq!(writer.send(r#"("search" "elm")"#).await, r#"("c-1")"#);
    assert_eq!(reader.send("(oops").await, r#"("error" "malformed")"#);

    stop.send(()).unwrap();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn oversize_and_binary_lines_keep_the_connection_open() {
    let store = Arc::new(MemoryStore::new());
    let credentials = CredentialTable::new(Vec::<UserEntry>::new());
    let dispatcher = Arc::new(Dispatcher::new(store.clone(), store, Arc::new(credentials)));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(server::serve(listener, dispatcher, 64, async move {
        let _ = stopped.await;
    }));

    let mut conn = Connection::open(addr).await;
    let malformed = r#"("error" "malformed")"#;

    assert_eq!(conn.send_bytes(b"(\"\xc3\x28\")").await, malformed);
    assert_eq!(conn.send(&"(".repeat(1 << 20)).await, malformed);
    assert_eq!(conn.send(r#"("version?")"#).await, "1");

    stop.send(()).unwrap();
    server.await.unwrap().unwrap();
}
