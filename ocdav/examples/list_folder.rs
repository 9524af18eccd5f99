// Copyright 2023 Hugo Osvaldo Barrera
//
// SPDX-License-Identifier: EUPL-1.2

//! An example of some basic usage of the `DavClient` type.
//!
//! Usage:
//!
//!     cargo run --example=list_folder https://cloud.example.com alice MYPASSWORD /Photos
//!     cargo run --example=list_folder $SERVER_URL                $USERNAME $PASSWORD $FOLDER
//!
//! Example output:
//!
//! ```
//! 📁 /Photos (678556 bytes)
//!    📄 bird.jpg, image/jpeg, 383631 bytes, etag: "f0e1b0a3c26b5d0a1f4b3c2d1e0f9a8b"
//!    📁 Holidays
//! ```
use http::Uri;
use ocdav::auth::Auth;
use ocdav::DavClient;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let mut arguments = std::env::args();
    arguments
        .next()
        .expect("binary has been called with a name");
    let base_url: Uri = arguments
        .next()
        .expect("$1 is defined")
        .parse()
        .expect("$1 is a valid URL");
    let username = arguments.next().expect("$2 is a valid username");
    let password = arguments.next().expect("$3 is a valid password").into();
    let folder = arguments.next().unwrap_or_else(|| String::from("/"));

    let client = DavClient::builder()
        .with_uri(base_url)
        .with_auth(Auth::Basic {
            username,
            password: Some(password),
        })
        .build();

    let mut entries = client.list(&folder, &[]).await.unwrap().into_iter();
    let Some(this) = entries.next() else {
        println!("{folder} not found");
        return;
    };
    println!("📁 {} ({} bytes)", this.full_path(), this.size().unwrap_or(0));

    for entry in entries {
        if entry.is_dir() {
            println!("   📁 {}", entry.name());
        } else {
            println!(
                "   📄 {}, {}, {} bytes, etag: {}",
                entry.name(),
                entry.content_type().unwrap_or("?"),
                entry.size().unwrap_or(0),
                entry.etag().unwrap_or("?"),
            );
        }
    }
}
