use std::sync::Arc;
use std::time::Duration;

use line_chat_server::{Server, ServerConfig};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::timeout;

const STEP: Duration = Duration::from_secs(5);

struct Client {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: std::net::SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read, writer) = stream.into_split();
        Self {
            lines: BufReader::new(read).lines(),
            writer,
        }
    }

    async fn say(&mut self, line: &str) {
        self.writer
            .write_all(format!("{line}\n").as_bytes())
            .await
            .unwrap();
    }

    async fn next(&mut self) -> Option<String> {
        timeout(STEP, self.lines.next_line())
            .await
            .expect("timed out waiting for a line")
            .unwrap()
    }

    async fn expect(&mut self, line: &str) {
        assert_eq!(self.next().await.as_deref(), Some(line));
    }

    async fn join(addr: std::net::SocketAddr, greeting: &str, nick: &str) -> Self {
        let mut client = Self::connect(addr).await;
        client.expect(&format!("[Server] - Welcome to {greeting}")).await;
        client.expect("[Server] - Please enter a nickname").await;
        client.say(nick).await;
        client.expect(&format!("[Server] - Welcome [{nick}]")).await;
        client.expect(&format!("[Server] - [{nick}] has joined")).await;
        client
    }
}

async fn start(config: ServerConfig) -> (Arc<Server>, std::net::SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = Arc::new(Server::new(config));
    let task = tokio::spawn(line_chat_server::run(server.clone(), listener));
    (server, addr, task)
}

fn lobby_config() -> ServerConfig {
    ServerConfig::from_args(["port:0", "adminPass:secret", "name:Lobby"]).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn lobby_scenario() {
    let (server, addr, _task) = start(lobby_config()).await;

    let mut alice = Client::join(addr, "Lobby", "Alice").await;
    let mut bob = Client::join(addr, "Lobby", "Bob").await;
    alice.expect("[Server] - [Bob] has joined").await;

    alice.say("hello").await;
    alice.expect("[Alice] - hello").await;
    bob.expect("[Alice] - hello").await;

    bob.say("!adminLogin secret").await;
    bob.expect("[Server] - You have successfully logged in").await;

    bob.say("!kick Alice").await;
    bob.expect("[Server] - [Alice] has been kicked").await;
    alice.expect("[Server] - [Alice] has been kicked").await;
    alice.expect("[Server] - You have been kicked").await;
    assert_eq!(alice.next().await, None);

    assert_eq!(server.member_count().await, 1);
    let members = server.members().await;
    assert_eq!(members[0].nickname.as_str(), "Bob");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_chatters_see_the_same_order() {
    let (_server, addr, _task) = start(lobby_config()).await;

    let mut clients: Vec<Client> = Vec::new();
    for nick in ["A", "B", "C"] {
        let client = Client::join(addr, "Lobby", nick).await;
        for earlier in clients.iter_mut() {
            earlier.expect(&format!("[Server] - [{nick}] has joined")).await;
        }
        clients.push(client);
    }

    const PER_CLIENT: usize = 20;
    for client in clients.iter_mut() {
        for i in 0..PER_CLIENT {
            client.say(&format!("msg {i}")).await;
        }
    }

    let mut transcripts = Vec::new();
    for client in clients.iter_mut() {
        let mut seen = Vec::new();
        for _ in 0..PER_CLIENT * 3 {
            seen.push(client.next().await.unwrap());
        }
        transcripts.push(seen);
    }

    assert_eq!(transcripts[0], transcripts[1]);
    assert_eq!(transcripts[1], transcripts[2]);
    for nick in ["A", "B", "C"] {
        let own: Vec<_> = transcripts[0]
            .iter()
            .filter(|line| line.starts_with(&format!("[{nick}] - ")))
            .cloned()
            .collect();
        let expected: Vec<_> = (0..PER_CLIENT)
            .map(|i| format!("[{nick}] - msg {i}"))
            .collect();
        assert_eq!(own, expected);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_flushes_and_stops_accepting() {
    let (server, addr, task) = start(lobby_config()).await;

    let mut alice = Client::join(addr, "Lobby", "Alice").await;
    let mut bob = Client::join(addr, "Lobby", "Bob").await;
    alice.expect("[Server] - [Bob] has joined").await;

    alice.say("!shutdown").await;
    alice.expect("[Server] - You are not authorized to use this command").await;

    alice.say("!adminLogin secret").await;
    alice.expect("[Server] - You have successfully logged in").await;
    alice.say("!shutdown").await;

    for client in [&mut alice, &mut bob] {
        client.expect("[Server] - Shutting down").await;
        assert_eq!(client.next().await, None);
    }

    timeout(STEP, task).await.unwrap().unwrap();
    assert!(server.is_shutting_down());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn admin_disabled_without_password() {
    let config = ServerConfig::from_args(["port:0"]).unwrap();
    let (_server, addr, _task) = start(config).await;

    let mut alice = Client::join(addr, "Unnamed Server", "Alice").await;
    alice.say("!adminLogin ").await;
    alice.expect("[Server] - This server may not be accessed remotely").await;
    alice.say("!setServerName Mine").await;
    alice.expect("[Server] - You are not authorized to use this command").await;
}
