//! Mock SheetDrop API server for testing
//!
//! Serves the rule endpoints from an in-memory list:
//! - GET /gmail/rules/ returns [...] (or { data: [...] })
//! - POST /gmail/rules/ stores the payload and returns it with an id
//! - PUT /gmail/rules/{id}/ replaces the rule
//! - DELETE /gmail/rules/{id}/ removes it (204, or 404 if unknown)
//!
//! Requests must carry `Authorization: Bearer valid_...`.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use serde_json::json;

use crate::domain::Rule;

/// Mock rule server for testing
pub struct MockRuleServer {
    port: u16,
    running: Arc<AtomicBool>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

/// Mock server behavior
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Number of rules present at startup
    pub seed_rules: usize,
    /// Wrap list responses in `{ "data": [...] }`
    pub wrap_list: bool,
    /// Answer POST/PUT with HTTP 500
    pub fail_writes: bool,
    /// Answer POST/PUT with a body that is not a rule
    pub empty_write_body: bool,
    /// List a rule (id 99) whose match type the client does not know
    pub foreign_match_type: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            seed_rules: 2,
            wrap_list: false,
            fail_writes: false,
            empty_write_body: false,
            foreign_match_type: false,
        }
    }
}

struct Store {
    rules: Vec<Rule>,
    next_id: i64,
}

impl MockRuleServer {
    /// Start a new mock server on a random available port
    pub fn start(config: MockConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let store = Arc::new(Mutex::new(Store {
            rules: seed_rules(config.seed_rules),
            next_id: config.seed_rules as i64 + 1,
        }));

        listener.set_nonblocking(true)?;

        let thread_handle = thread::spawn(move || {
            while running_clone.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        let cfg = config.clone();
                        let store = Arc::clone(&store);
                        thread::spawn(move || handle_connection(stream, &cfg, &store));
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(std::time::Duration::from_millis(10));
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            port,
            running,
            thread_handle: Some(thread_handle),
        })
    }

    /// Base URL of the API, without the rules path
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockRuleServer {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Request {
    method: String,
    path: String,
    authorization: Option<String>,
    body: String,
}

fn read_request(stream: &TcpStream) -> Option<Request> {
    stream.set_nonblocking(false).ok()?;
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut content_length = 0usize;
    let mut authorization = None;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).ok()? == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            let value = value.trim();
            match key.trim().to_lowercase().as_str() {
                "content-length" => content_length = value.parse().unwrap_or(0),
                "authorization" => authorization = Some(value.to_string()),
                _ => {}
            }
        }
    }

    let mut body = vec![0; content_length];
    reader.read_exact(&mut body).ok()?;

    Some(Request {
        method,
        path,
        authorization,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

fn handle_connection(mut stream: TcpStream, config: &MockConfig, store: &Mutex<Store>) {
    let Some(request) = read_request(&stream) else {
        send_response(&mut stream, 400, "Bad Request", r#"{"error": "Invalid request"}"#);
        return;
    };

    let authorized = request
        .authorization
        .as_deref()
        .is_some_and(|a| a.starts_with("Bearer valid_"));
    if !authorized {
        send_response(&mut stream, 401, "Unauthorized", r#"{"detail": "Invalid token"}"#);
        return;
    }

    let path = request.path.split('?').next().unwrap_or("");
    let rule_id = path
        .strip_prefix("/gmail/rules/")
        .map(|rest| rest.trim_end_matches('/'))
        .filter(|rest| !rest.is_empty())
        .map(|rest| rest.parse::<i64>().ok());

    if !path.starts_with("/gmail/rules/") {
        send_response(&mut stream, 404, "Not Found", r#"{"detail": "Not found"}"#);
        return;
    }

    let is_write = matches!(request.method.as_str(), "POST" | "PUT");
    if is_write && config.fail_writes {
        send_response(&mut stream, 500, "Internal Server Error", r#"{"detail": "boom"}"#);
        return;
    }

    let mut store = match store.lock() {
        Ok(store) => store,
        Err(_) => {
            send_response(&mut stream, 500, "Internal Server Error", "{}");
            return;
        }
    };

    match (request.method.as_str(), rule_id) {
        ("GET", None) => {
            let mut rules = json!(store.rules);
            if config.foreign_match_type {
                if let Some(list) = rules.as_array_mut() {
                    list.push(json!({
                        "id": 99,
                        "name": "Pattern rule",
                        "is_active": true,
                        "subject_match_type": "regex",
                        "subject_value": "inv.*"
                    }));
                }
            }
            let body = if config.wrap_list {
                json!({ "data": rules })
            } else {
                rules
            };
            send_response(&mut stream, 200, "OK", &body.to_string());
        }
        ("POST", None) => match serde_json::from_str::<Rule>(&request.body) {
            Ok(mut rule) => {
                rule.id = Some(store.next_id);
                store.next_id += 1;
                store.rules.push(rule.clone());
                send_write(&mut stream, config, 201, "Created", &rule);
            }
            Err(_) => send_response(&mut stream, 400, "Bad Request", r#"{"detail": "bad body"}"#),
        },
        ("PUT", Some(Some(id))) => match serde_json::from_str::<Rule>(&request.body) {
            Ok(mut rule) => {
                rule.id = Some(id);
                match store.rules.iter_mut().find(|r| r.id == Some(id)) {
                    Some(existing) => {
                        *existing = rule.clone();
                        send_write(&mut stream, config, 200, "OK", &rule);
                    }
                    None if config.empty_write_body => {
                        send_response(&mut stream, 200, "OK", r#"{"status": "ok"}"#)
                    }
                    None => send_response(&mut stream, 404, "Not Found", r#"{"detail": "Not found"}"#),
                }
            }
            Err(_) => send_response(&mut stream, 400, "Bad Request", r#"{"detail": "bad body"}"#),
        },
        ("DELETE", Some(Some(id))) => {
            let before = store.rules.len();
            store.rules.retain(|r| r.id != Some(id));
            if store.rules.len() < before {
                send_response(&mut stream, 204, "No Content", "");
            } else {
                send_response(&mut stream, 404, "Not Found", r#"{"detail": "Not found"}"#);
            }
        }
        _ => send_response(
            &mut stream,
            405,
            "Method Not Allowed",
            r#"{"detail": "Method not allowed"}"#,
        ),
    }
}

fn send_write(stream: &mut TcpStream, config: &MockConfig, status: u16, text: &str, rule: &Rule) {
    if config.empty_write_body {
        send_response(stream, status, text, r#"{"status": "ok"}"#);
    } else {
        let body = serde_json::to_string(rule).unwrap_or_else(|_| "{}".to_string());
        send_response(stream, status, text, &body);
    }
}

fn send_response(stream: &mut TcpStream, status: u16, status_text: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

fn seed_rules(count: usize) -> Vec<Rule> {
    (0..count)
        .map(|i| {
            let mut rule = Rule::new(format!("Seed rule {}", i + 1));
            rule.id = Some(i as i64 + 1);
            rule.subject_value = Some(format!("Invoice {}", i + 1));
            rule
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_starts_on_random_port() {
        let mut server = MockRuleServer::start(MockConfig::default()).unwrap();
        let url = server.base_url();
        let port: u16 = url.trim_start_matches("http://127.0.0.1:").parse().unwrap();
        assert!(port > 0);
        server.stop();
    }
}
