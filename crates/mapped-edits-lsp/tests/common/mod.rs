//! Common test utilities for integration tests.
//!
//! Provides the `LspClient` used to drive the server binary over stdio.

use serde_json::{Value, json};
use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Child, Command, Stdio};

/// LSP test client for communicating with the server binary.
pub(crate) struct LspClient {
    process: Child,
    /// Notifications received while waiting for responses, in order.
    notifications: Vec<Value>,
    reader: BufReader<std::process::ChildStdout>,
}

impl LspClient {
    /// Spawn the mapped-edits-lsp binary.
    pub(crate) fn spawn() -> Self {
        let mut process = Command::new(env!("CARGO_BIN_EXE_mapped-edits-lsp"))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("Failed to spawn mapped-edits-lsp binary");

        let stdout = process.stdout.take().expect("Failed to capture stdout");

        Self {
            process,
            notifications: Vec::new(),
            reader: BufReader::new(stdout),
        }
    }

    /// Notifications captured so far.
    #[allow(dead_code)] // Not used in all tests
    pub(crate) fn notifications(&self) -> &[Value] {
        &self.notifications
    }

    /// Send a JSON-RPC message to the server.
    pub(crate) fn send(&mut self, message: &Value) {
        let body = serde_json::to_string(message).unwrap();
        let header = format!("Content-Length: {}\r\n\r\n", body.len());

        let stdin = self.process.stdin.as_mut().expect("stdin not captured");
        stdin.write_all(header.as_bytes()).unwrap();
        stdin.write_all(body.as_bytes()).unwrap();
        stdin.flush().unwrap();
    }

    /// Read messages until the response with `expected_id` arrives.
    ///
    /// Notifications and server-to-client requests seen on the way are
    /// captured.
    pub(crate) fn read_response(&mut self, expected_id: i64) -> Value {
        loop {
            let message = self.read_message();

            if message.get("method").is_some() {
                self.notifications.push(message);
                continue;
            }
            if message.get("id") == Some(&json!(expected_id)) {
                return message;
            }
        }
    }

    fn read_message(&mut self) -> Value {
        let mut content_length = 0;
        loop {
            let mut line = String::new();
            let bytes_read = self
                .reader
                .read_line(&mut line)
                .expect("Failed to read header");

            assert!(bytes_read != 0, "Server closed connection unexpectedly");

            if line == "\r\n" || line == "\n" {
                break;
            }
            if line.to_lowercase().starts_with("content-length:") {
                content_length = line
                    .split(':')
                    .nth(1)
                    .unwrap()
                    .trim()
                    .parse()
                    .expect("Invalid content length");
            }
        }

        let mut body = vec![0u8; content_length];
        self.reader
            .read_exact(&mut body)
            .expect("Failed to read body");

        serde_json::from_slice(&body).unwrap_or_else(|e| {
            panic!("Invalid JSON: {e} in: {:?}", String::from_utf8_lossy(&body))
        })
    }

    /// Initialize the LSP session.
    pub(crate) fn initialize(&mut self, options: Value) -> Value {
        self.send(&json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "processId": null,
                "capabilities": {},
                "rootUri": "file:///tmp",
                "initializationOptions": options
            }
        }));

        let response = self.read_response(1);

        self.send(&json!({
            "jsonrpc": "2.0",
            "method": "initialized",
            "params": {}
        }));

        response
    }

    /// Open a text document.
    pub(crate) fn did_open(&mut self, uri: &str, language_id: &str, text: &str) {
        self.send(&json!({
            "jsonrpc": "2.0",
            "method": "textDocument/didOpen",
            "params": {
                "textDocument": {
                    "uri": uri,
                    "languageId": language_id,
                    "version": 1,
                    "text": text
                }
            }
        }));
    }

    /// Replace the whole text of an open document.
    #[allow(dead_code)] // Not used in all tests
    pub(crate) fn did_change(&mut self, uri: &str, version: i32, text: &str) {
        self.send(&json!({
            "jsonrpc": "2.0",
            "method": "textDocument/didChange",
            "params": {
                "textDocument": {"uri": uri, "version": version},
                "contentChanges": [{"text": text}]
            }
        }));
    }

    /// Close a text document.
    #[allow(dead_code)] // Not used in all tests
    pub(crate) fn did_close(&mut self, uri: &str) {
        self.send(&json!({
            "jsonrpc": "2.0",
            "method": "textDocument/didClose",
            "params": {
                "textDocument": {"uri": uri}
            }
        }));
    }

    /// Request mapped edits.
    pub(crate) fn provide_mapped_edits(
        &mut self,
        id: i64,
        uri: &str,
        code_blocks: &[&str],
        context: Value,
    ) -> Value {
        self.send(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "mappedEdits/provide",
            "params": {
                "textDocument": {"uri": uri},
                "codeBlocks": code_blocks,
                "context": context
            }
        }));
        self.read_response(id)
    }

    /// Shutdown the server.
    pub(crate) fn shutdown(&mut self) -> Value {
        self.send(&json!({
            "jsonrpc": "2.0",
            "id": 999,
            "method": "shutdown"
        }));
        self.read_response(999)
    }
}

impl Drop for LspClient {
    fn drop(&mut self) {
        let _ = self.process.kill();
    }
}
