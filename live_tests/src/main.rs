// Copyright 2023 Hugo Osvaldo Barrera
//
// SPDX-License-Identifier: EUPL-1.2

//! Tests that require a live ownCloud or Nextcloud server.
//!
//! Requires `OCDAV_SERVER`, `OCDAV_USERNAME` and `OCDAV_PASSWORD`. `OCDAV_ROOT` optionally
//! overrides the DAV root path.

use anyhow::{ensure, Context};
use http::StatusCode;
use ocdav::{auth::Auth, dav::DavError, DavClient};
use rand::{distributions::Alphanumeric, thread_rng, Rng};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    simple_logger::init_with_level(log::Level::Error).expect("logger configuration is valid");

    let client = create_test_client_from_env().context("could not initialise test client")?;
    println!("☁️ Running tests for: {}", client.base_url());

    let results = vec![
        test_create_and_delete_folder(&client)
            .await
            .context("create and delete folder"),
        test_move_and_copy_folder(&client)
            .await
            .context("move and copy folder"),
        test_toggle_favorite(&client)
            .await
            .context("toggle favorite flag"),
        test_fetch_missing(&client)
            .await
            .context("attempt to fetch inexistant resource"),
        test_search(&client).await.context("search by name"),
    ];

    let mut failed = 0;
    for result in &results {
        if let Err(err) = result {
            println!("🔥 Test failed: {err:?}");
            failed += 1;
            println!("-----");
        }
    }
    let total = results.len();
    let passed = total - failed;

    println!("✅ Tests passed: {passed}/{total}");
    if failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn create_test_client_from_env() -> anyhow::Result<DavClient> {
    let server = std::env::var("OCDAV_SERVER").context("Could not read OCDAV_SERVER")?;
    let username = std::env::var("OCDAV_USERNAME").context("Could not read OCDAV_USERNAME")?;
    let password = std::env::var("OCDAV_PASSWORD").context("Could not read OCDAV_PASSWORD")?;

    let builder = DavClient::builder()
        .with_uri(server.parse()?)
        .with_auth(Auth::Basic {
            username,
            password: Some(password.into()),
        });
    let builder = match std::env::var("OCDAV_ROOT") {
        Ok(root) => builder.with_root(root),
        Err(_) => builder,
    };
    Ok(builder.build())
}

fn random_string(len: usize) -> String {
    thread_rng()
        .sample_iter(Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

async fn count_children(client: &DavClient, path: &str) -> anyhow::Result<usize> {
    let entries = client.list(path, &[]).await?;
    Ok(entries.len().saturating_sub(1))
}

async fn test_create_and_delete_folder(client: &DavClient) -> anyhow::Result<()> {
    let orig_count = count_children(client, "/").await?;

    let name = random_string(16);
    let path = format!("/{name}");
    client.create_folder(&path).await?;

    ensure!(
        count_children(client, "/").await? == orig_count + 1,
        "folder count did not grow"
    );
    let entries = client.list("/", &[]).await?;
    let created = entries
        .iter()
        .find(|entry| entry.name() == name)
        .context("created folder was not returned when listing")?;
    ensure!(created.is_dir(), "created folder is not a directory");
    ensure!(
        created.content_type() == Some("httpd/unix-directory"),
        "unexpected content type for folder"
    );

    // Creating it twice must fail.
    client.create_folder(&path).await.unwrap_err();

    client.delete(&path).await?;
    ensure!(
        count_children(client, "/").await? == orig_count,
        "folder count did not shrink after deletion"
    );

    Ok(())
}

async fn test_move_and_copy_folder(client: &DavClient) -> anyhow::Result<()> {
    let original = format!("/{} with spaces", random_string(12));
    let moved = format!("/{} ünïcödé", random_string(12));
    let copied = format!("/{}", random_string(12));

    client.create_folder(&original).await?;
    client.move_resource(&original, &moved, false).await?;
    client.copy_resource(&moved, &copied, false).await?;

    let moved_info = client
        .file_info(&moved, &[])
        .await?
        .context("moved folder not found")?;
    ensure!(moved_info.full_path() == moved, "unexpected path after move");
    ensure!(
        client.file_info(&copied, &[]).await?.is_some(),
        "copied folder not found"
    );

    match client.file_info(&original, &[]).await {
        Err(DavError::BadStatusCode {
            status: StatusCode::NOT_FOUND,
            ..
        }) => {}
        other => anyhow::bail!("original folder still present after move: {other:?}"),
    }

    client.delete(&moved).await?;
    client.delete(&copied).await?;
    Ok(())
}

async fn test_toggle_favorite(client: &DavClient) -> anyhow::Result<()> {
    let path = format!("/{}", random_string(16));
    client.create_folder(&path).await?;

    client.set_favorite(&path, true).await?;
    let info = client.file_info(&path, &[]).await?.context("folder not found")?;
    ensure!(info.is_favorite(), "folder is not a favourite after marking it");

    let favorites = client.favorites(&[]).await?;
    ensure!(
        favorites.iter().any(|f| f.full_path() == path),
        "folder not returned among favourites"
    );

    client.set_favorite(&path, false).await?;
    let info = client.file_info(&path, &[]).await?.context("folder not found")?;
    ensure!(!info.is_favorite(), "folder is still a favourite");

    client.delete(&path).await?;
    Ok(())
}

async fn test_fetch_missing(client: &DavClient) -> anyhow::Result<()> {
    let path = format!("/{}", random_string(16));
    let err = client
        .file_info(&path, &[])
        .await
        .expect_err("fetching a missing resource must fail");
    ensure!(
        std::io::Error::from(err).kind() == std::io::ErrorKind::NotFound,
        "missing resource did not map to NotFound"
    );
    Ok(())
}

async fn test_search(client: &DavClient) -> anyhow::Result<()> {
    let name = random_string(16);
    let path = format!("/{name}");
    client.create_folder(&path).await?;

    let found = client.search(&name, Some(5), &[]).await?;
    client.delete(&path).await?;

    ensure!(
        found.iter().any(|f| f.name() == name),
        "created folder not found by search"
    );
    Ok(())
}
