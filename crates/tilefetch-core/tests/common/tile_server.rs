//! Minimal HTTP/1.1 tile server for integration tests.
//!
//! One request per connection (`Connection: close`). Routes:
//! - `/tiles/...png`: 200 `image/png` with [`TILE`]
//! - `/empty`: 204
//! - `/missing`: 404 HTML page
//! - `/wms-error`: 200 `text/xml` service exception
//! - `/untyped`: 200 without `Content-Type`
//! - `/echo`: 200 `text/plain`, body = the raw request as received
//! - `/login`: 200 `image/png` with a `Set-Cookie`
//! - `/slow/...`: like `/tiles/`, answered after [`SLOW_LATENCY`]
//!
//! [`start_tls`] serves the same routes over TLS with a fresh self-signed
//! certificate for `127.0.0.1`.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, MsbOption};
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::ssl::{SslAcceptor, SslMethod};
use openssl::x509::extension::{BasicConstraints, SubjectAlternativeName};
use openssl::x509::{X509NameBuilder, X509};

pub const TILE: &[u8] = b"\x89PNG\r\n\x1a\nfake-tile";
pub const SERVICE_EXCEPTION: &str = "<ServiceException>unknown layer</ServiceException>";
pub const SLOW_LATENCY: Duration = Duration::from_millis(300);

/// Starts the server in a background thread. Returns the base URL without a
/// trailing slash (e.g. "http://127.0.0.1:12345"). Runs until the process exits.
pub fn start() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            thread::spawn(move || {
                set_timeouts(&stream);
                handle(stream)
            });
        }
    });
    format!("http://127.0.0.1:{}", port)
}

/// Base URL of a port nothing listens on.
pub fn refused() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

/// A TLS tile server and the PEM file of its self-signed certificate.
pub struct TlsServer {
    /// e.g. "https://127.0.0.1:12345", no trailing slash.
    pub base: String,
    pub ca_file: PathBuf,
    _dir: tempfile::TempDir,
}

/// Starts the routes of [`start`] behind TLS.
pub fn start_tls() -> TlsServer {
    let (cert, key) = self_signed();
    let mut builder = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls()).expect("acceptor");
    builder.set_private_key(&key).expect("private key");
    builder.set_certificate(&cert).expect("certificate");
    builder.check_private_key().expect("key matches certificate");
    let acceptor = Arc::new(builder.build());

    let dir = tempfile::tempdir().expect("tempdir");
    let ca_file = dir.path().join("ca.pem");
    std::fs::write(&ca_file, cert.to_pem().expect("pem")).expect("write ca");

    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let acceptor = Arc::clone(&acceptor);
            thread::spawn(move || {
                set_timeouts(&stream);
                // Clients that reject the certificate abort the handshake.
                if let Ok(tls) = acceptor.accept(stream) {
                    handle(tls);
                }
            });
        }
    });

    TlsServer {
        base: format!("https://127.0.0.1:{}", port),
        ca_file,
        _dir: dir,
    }
}

fn self_signed() -> (X509, PKey<Private>) {
    let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", "127.0.0.1").unwrap();
    let name = name.build();

    let mut serial = BigNum::new().unwrap();
    serial.rand(64, MsbOption::MAYBE_ZERO, false).unwrap();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    builder
        .set_serial_number(&serial.to_asn1_integer().unwrap())
        .unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&key).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(1).unwrap())
        .unwrap();
    builder
        .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
        .unwrap();
    let san = SubjectAlternativeName::new()
        .ip("127.0.0.1")
        .build(&builder.x509v3_context(None, None))
        .unwrap();
    builder.append_extension(san).unwrap();
    builder.sign(&key, MessageDigest::sha256()).unwrap();
    (builder.build(), key)
}

fn set_timeouts(stream: &TcpStream) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
}

fn handle<S: Read + Write>(mut stream: S) {
    let Some(raw) = read_request(&mut stream) else {
        return;
    };
    let path = raw
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();

    let (status, headers, body): (&str, Vec<&str>, Vec<u8>) = match path.as_str() {
        p if p.starts_with("/tiles/") => ("200 OK", vec!["Content-Type: image/png"], TILE.to_vec()),
        p if p.starts_with("/slow/") => {
            thread::sleep(SLOW_LATENCY);
            ("200 OK", vec!["Content-Type: image/png"], TILE.to_vec())
        }
        "/empty" => ("204 No Content", vec![], Vec::new()),
        "/missing" => (
            "404 Not Found",
            vec!["Content-Type: text/html"],
            b"<h1>not found</h1>".to_vec(),
        ),
        "/wms-error" => (
            "200 OK",
            vec!["Content-Type: text/xml"],
            SERVICE_EXCEPTION.as_bytes().to_vec(),
        ),
        "/untyped" => ("200 OK", vec![], b"???".to_vec()),
        "/echo" => ("200 OK", vec!["Content-Type: text/plain"], raw.clone().into_bytes()),
        "/login" => (
            "200 OK",
            vec!["Content-Type: image/png", "Set-Cookie: session=abc123; Path=/"],
            TILE.to_vec(),
        ),
        _ => ("404 Not Found", vec![], Vec::new()),
    };

    let mut head = format!("HTTP/1.1 {}\r\nConnection: close\r\n", status);
    for h in headers {
        head.push_str(h);
        head.push_str("\r\n");
    }
    if !status.starts_with("204") {
        head.push_str(&format!("Content-Length: {}\r\n", body.len()));
    }
    head.push_str("\r\n");
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&body);
    let _ = stream.flush();
}

/// Reads the request head and, when `Content-Length` is given, the body.
fn read_request<S: Read>(stream: &mut S) -> Option<String> {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    let head_end = loop {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buf[..n]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&data[..head_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while data.len() < head_end + content_length {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
    }
    Some(String::from_utf8_lossy(&data).to_string())
}
