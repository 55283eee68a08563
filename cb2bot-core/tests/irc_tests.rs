// tests/irc_tests.rs

mod test_utils;

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{duplex, split, AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf};
use tokio::time::timeout;

use cb2bot_common::traits::ChatSink;
use cb2bot_core::auth::AuthState;
use cb2bot_core::platforms::twitch_irc::{ChatLink, ChatLinkExit, TwitchIrcClient, JOIN_ANNOUNCEMENT};
use cb2bot_core::services::{CommandEngine, CooldownRegistry, EngineSettings, GreetingTracker};

use test_utils::{memory_repo, MockTwitchApi};

const CHANNEL: &str = "#cb2chan";

/// The server side of an in-memory IRC connection.
struct FakeServer {
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    writer: WriteHalf<DuplexStream>,
}

impl FakeServer {
    async fn next_line(&mut self) -> String {
        timeout(Duration::from_secs(2), self.lines.next_line())
            .await
            .expect("timed out waiting for the bot")
            .expect("read error")
            .expect("bot closed the connection")
    }

    async fn send(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\r\n").await.unwrap();
        self.writer.flush().await.unwrap();
    }

    async fn privmsg(&mut self, nick: &str, text: &str) {
        self.send(&format!(":{0}!{0}@{0}.tmi.twitch.tv PRIVMSG {1} :{2}", nick, CHANNEL, text))
            .await;
    }
}

fn connect() -> (TwitchIrcClient, FakeServer) {
    let (bot_io, server_io) = duplex(8 * 1024);
    let client = TwitchIrcClient::from_stream(bot_io, "CB2Bot", "oauth:token123");
    let (read_half, writer) = split(server_io);
    let server = FakeServer { lines: BufReader::new(read_half).lines(), writer };
    (client, server)
}

async fn expect_handshake(server: &mut FakeServer) {
    assert_eq!(server.next_line().await, "PASS oauth:token123");
    assert_eq!(server.next_line().await, "NICK cb2bot");
    assert_eq!(server.next_line().await, "CAP REQ :twitch.tv/tags");
}

async fn chat_link(client: TwitchIrcClient) -> ChatLink {
    let sender = client.sender(CHANNEL);
    let engine = CommandEngine::new(
        memory_repo().await,
        Arc::new(CooldownRegistry::new()),
        Arc::new(MockTwitchApi::default()),
        Arc::new(sender),
        Arc::new(AuthState::new()),
        EngineSettings {
            elevated_users: ["modjoe".to_string()].into_iter().collect(),
            cooldown_seconds: 30,
            channel_login: "cb2chan".to_string(),
        },
    );
    ChatLink::new(client, CHANNEL, Arc::new(engine), Arc::new(GreetingTracker::new()))
}

#[tokio::test]
async fn answers_ping_with_pong() {
    let (client, mut server) = connect();
    expect_handshake(&mut server).await;

    server.send("PING :tmi.twitch.tv").await;
    assert_eq!(server.next_line().await, "PONG :tmi.twitch.tv");

    client.shutdown();
}

#[tokio::test]
async fn sender_strips_line_breaks() {
    let (client, mut server) = connect();
    expect_handshake(&mut server).await;

    let sender = client.sender(CHANNEL);
    sender.send_message("one\nPRIVMSG #other :two").await.unwrap();
    assert_eq!(server.next_line().await, "PRIVMSG #cb2chan :one PRIVMSG #other :two");

    client.shutdown();
}

#[tokio::test]
async fn greets_once_routes_commands_and_stops_on_disconnect() {
    let (client, mut server) = connect();
    let link = chat_link(client).await;
    link.join().await.unwrap();

    expect_handshake(&mut server).await;
    assert_eq!(server.next_line().await, "JOIN #cb2chan");
    assert_eq!(server.next_line().await, format!("PRIVMSG #cb2chan :{}", JOIN_ANNOUNCEMENT));

    let run = tokio::spawn(async move {
        let mut link = link;
        let exit = link.run().await;
        (link, exit)
    });

    server.send(":tmi.twitch.tv 001 cb2bot :Welcome, GLHF!").await;
    server.privmsg("ada", "hi everyone").await;
    server.privmsg("ada", "HELLO again").await;
    server.privmsg("grace", "nice stream").await;
    server.privmsg("grace", "hey!").await;
    server.privmsg("viewer", "!so ada").await;
    server.privmsg("modjoe", "!so ada").await;
    server.privmsg("modjoe", "!disconnect").await;

    assert_eq!(server.next_line().await, "PRIVMSG #cb2chan :Hi ada :)");
    assert_eq!(server.next_line().await, "PRIVMSG #cb2chan :Hi grace :)");
    assert_eq!(
        server.next_line().await,
        "PRIVMSG #cb2chan :Check out ada at https://twitch.tv/ada !"
    );

    let (link, exit) = timeout(Duration::from_secs(2), run).await.unwrap().unwrap();
    assert_eq!(exit, ChatLinkExit::ShutdownRequested);
    link.close().await;
}

#[tokio::test]
async fn eof_ends_the_read_loop() {
    let (client, server) = connect();
    let mut link = chat_link(client).await;

    drop(server);

    let exit = timeout(Duration::from_secs(2), link.run()).await.unwrap();
    assert_eq!(exit, ChatLinkExit::ConnectionClosed);
    link.close().await;
}

#[tokio::test]
async fn tagged_lines_keep_the_login_as_identity() {
    let (client, mut server) = connect();
    let link = chat_link(client).await;
    expect_handshake(&mut server).await;

    let run = tokio::spawn(async move {
        let mut link = link;
        let exit = link.run().await;
        (link, exit)
    });

    server
        .send("@display-name=Ada;user-id=42 :ada!ada@ada.tmi.twitch.tv PRIVMSG #cb2chan :hello")
        .await;
    server
        .send("@display-name=Ada;user-id=42 :ada!ada@ada.tmi.twitch.tv PRIVMSG #cb2chan :hi again")
        .await;
    server
        .send("@display-name=モッド;user-id=1 :modjoe!modjoe@modjoe.tmi.twitch.tv PRIVMSG #cb2chan :!so grace")
        .await;
    server
        .send("@display-name=モッド;user-id=1 :modjoe!modjoe@modjoe.tmi.twitch.tv PRIVMSG #cb2chan :!disconnect")
        .await;

    assert_eq!(server.next_line().await, "PRIVMSG #cb2chan :Hi Ada :)");
    assert_eq!(
        server.next_line().await,
        "PRIVMSG #cb2chan :Check out grace at https://twitch.tv/grace !"
    );

    let (link, exit) = timeout(Duration::from_secs(2), run).await.unwrap().unwrap();
    assert_eq!(exit, ChatLinkExit::ShutdownRequested);
    link.close().await;
}
