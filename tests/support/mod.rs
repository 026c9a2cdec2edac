#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use assert_cmd::Command;
use serde_json::Value;

/// Variables the binaries read; cleared so the host environment cannot leak in.
const CLEARED_ENV: &[&str] = &[
    "BOKJA_CONFIG",
    "BOKJA_LOG",
    "BOKJA_TIMEOUT",
    "BOKJA_LLM_MODEL",
    "BOKJA_LLM_TEMPERATURE",
    "BOKJA_OCR_TEMPLATE_IDS",
    "OPENAI_API_KEY",
    "OPENAI_BASE_URL",
    "INCIZORLENS_API_URL",
    "INCIZORLENS_API_KEY",
    "NAVER_OCR_API_URL",
    "NAVER_OCR_SECRET_KEY",
    "GOOGLE_TTS_API_URL",
    "GOOGLE_TTS_API_KEY",
    "GOOGLE_OAUTH_ACCESS_TOKEN",
    "GOOGLE_APPLICATION_CREDENTIALS",
    "HTTP_PROXY",
    "HTTPS_PROXY",
    "ALL_PROXY",
    "http_proxy",
    "https_proxy",
    "all_proxy",
];

/// Isolates a binary from the host's credentials, config file and proxies.
pub fn isolated(mut cmd: Command) -> Command {
    for key in CLEARED_ENV {
        cmd.env_remove(key);
    }
    cmd.env("XDG_CONFIG_HOME", unique_temp_path("xdg"))
        .env("NO_PROXY", "127.0.0.1,localhost");
    cmd
}

pub fn unique_temp_path(label: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    std::env::temp_dir().join(format!("bokja-test-{label}-{}-{nanos}", std::process::id()))
}

pub fn parse_stdout_json(output: &[u8]) -> Value {
    let text = String::from_utf8(output.to_vec()).expect("stdout should be utf-8");
    assert_eq!(
        text.matches('\n').count(),
        1,
        "stdout should hold exactly one line: {text:?}"
    );
    serde_json::from_str(text.trim_end()).expect("stdout should contain valid JSON")
}

/// Request captured by [`MockServer`].
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("request body should be JSON")
    }

    pub fn body_contains(&self, needle: &[u8]) -> bool {
        self.body.windows(needle.len()).any(|window| window == needle)
    }
}

/// One-shot HTTP responder on 127.0.0.1 that records the request it serves.
pub struct MockServer {
    pub url: String,
    handle: JoinHandle<Option<CapturedRequest>>,
}

impl MockServer {
    pub fn respond(status: u16, body: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock server");
        listener
            .set_nonblocking(true)
            .expect("nonblocking listener");
        let url = format!("http://{}", listener.local_addr().expect("local addr"));
        let body = body.to_string();

        let handle = thread::spawn(move || {
            let deadline = Instant::now() + Duration::from_secs(20);
            let (stream, _) = loop {
                match listener.accept() {
                    Ok(pair) => break pair,
                    Err(_) if Instant::now() < deadline => {
                        thread::sleep(Duration::from_millis(10))
                    }
                    Err(_) => return None,
                }
            };
            stream.set_nonblocking(false).ok()?;

            let mut reader = BufReader::new(stream.try_clone().ok()?);
            let mut request_line = String::new();
            reader.read_line(&mut request_line).ok()?;

            let mut headers = Vec::new();
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).ok()?;
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((key, value)) = line.split_once(':') {
                    headers.push((key.trim().to_string(), value.trim().to_string()));
                }
            }

            let length = headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.parse::<usize>().ok())
                .unwrap_or(0);
            let mut request_body = vec![0; length];
            reader.read_exact(&mut request_body).ok()?;

            let reason = if status < 400 { "OK" } else { "Error" };
            let response = format!(
                "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let mut stream = stream;
            stream.write_all(response.as_bytes()).ok()?;
            stream.flush().ok()?;

            Some(CapturedRequest {
                request_line: request_line.trim_end().to_string(),
                headers,
                body: request_body,
            })
        });

        Self { url, handle }
    }

    /// Waits for the request to be served and returns it.
    pub fn request(self) -> CapturedRequest {
        self.handle
            .join()
            .expect("mock server thread")
            .expect("mock server should have received a request")
    }
}
