//! src/platforms/twitch_irc/client.rs

use std::io;

use async_trait::async_trait;
use tokio::io::{split, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_native_tls::TlsConnector;
use tracing::{debug, error, info};

use cb2bot_common::traits::ChatSink;

use crate::Error;

const DEFAULT_PONG_TARGET: &str = "tmi.twitch.tv";

/// Minimal representation of a parsed IRC message from Twitch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTwitchMsg {
    pub tags: Option<String>,
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
    pub trailing: Option<String>,
}

impl ParsedTwitchMsg {
    pub fn parse_irc_line(line: &str) -> Self {
        let mut rest = line.trim();
        let mut tags = None;
        let mut prefix = None;
        let mut command = String::new();
        let mut params = Vec::new();
        let mut trailing = None;

        // 1) tags
        if rest.starts_with('@') {
            match rest.find(' ') {
                Some(space_pos) => {
                    tags = Some(rest[..space_pos].to_string());
                    rest = &rest[space_pos + 1..];
                }
                None => {
                    return Self { tags: Some(rest.to_string()), prefix, command, params, trailing };
                }
            }
        }

        // 2) prefix
        if rest.starts_with(':') {
            match rest.find(' ') {
                Some(space_pos) => {
                    prefix = Some(rest[1..space_pos].to_string());
                    rest = &rest[space_pos + 1..];
                }
                None => {
                    prefix = Some(rest[1..].to_string());
                    return Self { tags, prefix, command, params, trailing };
                }
            }
        }

        // 3) command
        let mut parts = rest.splitn(2, ' ');
        if let Some(cmd) = parts.next() {
            command = cmd.to_string();
        }
        rest = parts.next().unwrap_or("");

        // 4) params + trailing
        if let Some(stripped) = rest.strip_prefix(':') {
            trailing = Some(stripped.to_string());
        } else if let Some(idx) = rest.find(" :") {
            trailing = Some(rest[idx + 2..].to_string());
            params.extend(rest[..idx].split_whitespace().map(|s| s.to_string()));
        } else {
            params.extend(rest.split_whitespace().map(|s| s.to_string()));
        }

        Self { tags, prefix, command, params, trailing }
    }

    /// Nick portion of a `nick!user@host` prefix.
    pub fn nick(&self) -> Option<&str> {
        let prefix = self.prefix.as_deref()?;
        match prefix.find('!') {
            Some(excl) => Some(&prefix[..excl]),
            None => None,
        }
    }
}

/// Higher-level event from the IRC read loop.
#[derive(Debug, Clone)]
pub struct IrcIncomingEvent {
    pub channel: Option<String>,
    /// Login from the `nick!user@host` prefix.
    pub user_name: Option<String>,
    /// `display-name` tag, when the server sent one.
    pub display_name: Option<String>,
    pub text: Option<String>,
    pub raw_line: String,
    pub command: String,
}

impl IrcIncomingEvent {
    /// Builds the event for one raw line. PING lines are answered in the reader and
    /// never reach this point.
    pub fn from_line(line: &str) -> Self {
        let parsed = ParsedTwitchMsg::parse_irc_line(line);
        let command = parsed.command.to_uppercase();

        let mut evt = IrcIncomingEvent {
            channel: parsed.params.first().cloned(),
            user_name: parsed.nick().map(|s| s.to_string()),
            display_name: None,
            text: None,
            raw_line: line.to_string(),
            command: command.clone(),
        };

        if command == "PRIVMSG" {
            evt.text = parsed.trailing.clone();
            evt.display_name = parsed
                .tags
                .as_deref()
                .and_then(|t| extract_tag_value(t, "display-name"))
                .filter(|v| !v.is_empty());
        }
        evt
    }
}

/// Low-level IRC client. One task reads lines, another owns the write half; everything
/// outbound goes through a single queue so lines are never interleaved on the socket.
pub struct TwitchIrcClient {
    raw_outgoing: mpsc::UnboundedSender<String>,

    /// Taken by whoever runs the read loop.
    pub incoming: Option<mpsc::UnboundedReceiver<IrcIncomingEvent>>,

    read_task: JoinHandle<()>,
    write_task: JoinHandle<()>,
}

impl TwitchIrcClient {
    /// Connects to `host:port` (TLS when `use_tls`), sends PASS/NICK/CAP and spawns the
    /// read/write tasks.
    pub async fn connect(
        host: &str,
        port: u16,
        use_tls: bool,
        username: &str,
        oauth_token: &str,
    ) -> io::Result<Self> {
        let tcp = TcpStream::connect((host, port))
            .await
            .map_err(|e| io::Error::other(format!("TCP connect error: {e}")))?;

        if !use_tls {
            info!("(TwitchIrcClient) connected to {}:{} (plain)", host, port);
            return Ok(Self::from_stream(tcp, username, oauth_token));
        }

        let native_connector = native_tls::TlsConnector::new()
            .map_err(|e| io::Error::other(format!("TLSConnector::new() => {e}")))?;
        let connector = TlsConnector::from(native_connector);
        let tls_stream = connector
            .connect(host, tcp)
            .await
            .map_err(|e| io::Error::other(format!("TLS connect() => {e}")))?;

        info!("(TwitchIrcClient) connected to {}:{} (TLS)", host, port);
        Ok(Self::from_stream(tls_stream, username, oauth_token))
    }

    /// Runs the client over an already-open stream.
    pub fn from_stream<S>(stream: S, username: &str, oauth_token: &str) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, write_half) = split(stream);

        let (tx_outgoing, rx_outgoing) = mpsc::unbounded_channel::<String>();
        let (tx_incoming, rx_incoming) = mpsc::unbounded_channel::<IrcIncomingEvent>();

        let write_task = tokio::spawn(Self::writer_loop(write_half, rx_outgoing));

        tx_outgoing.send(format!("PASS {}", oauth_token)).ok();
        tx_outgoing.send(format!("NICK {}", username.to_lowercase())).ok();
        tx_outgoing.send("CAP REQ :twitch.tv/tags".to_string()).ok();

        let read_task = tokio::spawn(Self::reader_loop(read_half, tx_incoming, tx_outgoing.clone()));

        Self {
            raw_outgoing: tx_outgoing,
            incoming: Some(rx_incoming),
            read_task,
            write_task,
        }
    }

    async fn reader_loop<R>(
        read_half: R,
        tx_incoming: mpsc::UnboundedSender<IrcIncomingEvent>,
        tx_outgoing: mpsc::UnboundedSender<String>,
    )
    where
        R: AsyncRead + Unpin,
    {
        let mut reader = BufReader::new(read_half);
        let mut line_buffer = String::new();

        loop {
            line_buffer.clear();
            match reader.read_line(&mut line_buffer).await {
                Ok(0) => {
                    info!("(TwitchIrcClient) read_loop => EOF");
                    break;
                }
                Ok(_) => {
                    let line = line_buffer.trim_end();
                    if line.is_empty() {
                        continue;
                    }
                    debug!("<< {}", line);

                    let parsed = ParsedTwitchMsg::parse_irc_line(line);
                    if parsed.command.eq_ignore_ascii_case("PING") {
                        let target = parsed
                            .trailing
                            .clone()
                            .or_else(|| parsed.params.first().cloned())
                            .unwrap_or_else(|| DEFAULT_PONG_TARGET.to_string());
                        tx_outgoing.send(format!("PONG :{}", target)).ok();
                        debug!("Auto PONG -> {}", target);
                        continue;
                    }

                    if tx_incoming.send(IrcIncomingEvent::from_line(line)).is_err() {
                        debug!("(TwitchIrcClient) incoming receiver dropped");
                        break;
                    }
                }
                Err(e) => {
                    error!("(TwitchIrcClient) read error => {:?}", e);
                    break;
                }
            }
        }

        info!("(TwitchIrcClient) reader_loop ended.");
    }

    async fn writer_loop<W>(
        write_half: W,
        mut rx_outgoing: mpsc::UnboundedReceiver<String>,
    )
    where
        W: AsyncWrite + Unpin,
    {
        let mut writer = BufWriter::new(write_half);

        while let Some(line) = rx_outgoing.recv().await {
            if line.starts_with("PASS ") {
                debug!(">> PASS ****");
            } else {
                debug!(">> {}", line);
            }
            if let Err(e) = writer.write_all(line.as_bytes()).await {
                error!("writer error => {:?}", e);
                break;
            }
            if let Err(e) = writer.write_all(b"\r\n").await {
                error!("writer error => {:?}", e);
                break;
            }
            if let Err(e) = writer.flush().await {
                error!("writer flush error => {:?}", e);
                break;
            }
        }

        info!("(TwitchIrcClient) writer_loop ended.");
    }

    pub fn send_raw_line(&self, line: &str) -> Result<(), Error> {
        self.raw_outgoing
            .send(line.to_string())
            .map_err(|_| Error::Platform("IRC writer is closed".into()))
    }

    pub fn join_channel(&self, channel: &str) -> Result<(), Error> {
        self.send_raw_line(&format!("JOIN {}", channel))
    }

    pub fn send_privmsg(&self, channel: &str, message: &str) -> Result<(), Error> {
        self.send_raw_line(&format_privmsg(channel, message))
    }

    /// A cloneable handle that posts into `channel`.
    pub fn sender(&self, channel: &str) -> IrcChatSender {
        IrcChatSender {
            raw_outgoing: self.raw_outgoing.clone(),
            channel: channel.to_string(),
        }
    }

    /// True once the reader has stopped (EOF or error).
    pub fn is_closed(&self) -> bool {
        self.read_task.is_finished()
    }

    /// Aborts the read/write tasks.
    pub fn shutdown(self) {
        self.read_task.abort();
        self.write_task.abort();
    }
}

/// Cloneable [`ChatSink`] over the client's outbound queue.
#[derive(Clone)]
pub struct IrcChatSender {
    raw_outgoing: mpsc::UnboundedSender<String>,
    channel: String,
}

impl IrcChatSender {
    pub fn channel(&self) -> &str {
        &self.channel
    }
}

#[async_trait]
impl ChatSink for IrcChatSender {
    async fn send_message(&self, text: &str) -> Result<(), Error> {
        self.raw_outgoing
            .send(format_privmsg(&self.channel, text))
            .map_err(|_| Error::Platform("No active Twitch IRC connection".into()))
    }
}

/// `PRIVMSG <target> :<text>` with any CR/LF in `text` flattened to spaces.
pub fn format_privmsg(target: &str, text: &str) -> String {
    let clean: String = text
        .chars()
        .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
        .collect();
    format!("PRIVMSG {} :{}", target, clean)
}

/// Helper to extract `key=value` from a tag string like `@badge-info=;user-id=1234;...`
fn extract_tag_value(tag_str: &str, key: &str) -> Option<String> {
    tag_str
        .trim_start_matches('@')
        .split(';')
        .find_map(|kv| {
            let mut parts = kv.splitn(2, '=');
            let left = parts.next().unwrap_or("");
            let right = parts.next().unwrap_or("");
            (left == key).then(|| right.to_string())
        })
}
