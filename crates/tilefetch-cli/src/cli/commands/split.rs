//! `tilefetch split <url>` – show request URL and credentials.

use tilefetch_core::credentials;

pub fn run_split(url: &str) {
    println!("{}", describe_split(url));
}

/// Request URL, username and a masked password, one per line.
pub(crate) fn describe_split(url: &str) -> String {
    let (clean, creds) = credentials::split(url);
    let password = match creds.password.as_deref() {
        Some("") => "(empty)",
        Some(_) => "********",
        None => "(none)",
    };
    format!(
        "url:      {}\nusername: {}\npassword: {}",
        clean,
        creds.username.as_deref().unwrap_or("(none)"),
        password
    )
}
