use anyhow::Result;

use super::*;

#[test]
fn it_builds_a_valid_command() {
    build().debug_assert();
}

#[test]
fn it_collects_matches_down_to_the_leaf() -> Result<()> {
    let matches = build().try_get_matches_from(vec![
        "ttmdocs",
        "--api-url",
        "https://docs.example.com",
        "files",
        "show",
        "f-1",
        "--content",
    ])?;

    let chain = matches_chain(&matches);
    assert_eq!(chain.len(), 3);
    assert_eq!(required(chain[2], "id")?, "f-1");
    assert!(chain[2].get_flag("content"));
    assert_eq!(
        chain[2].get_one::<String>("api-url").map(|e| return e.as_str()),
        Some("https://docs.example.com")
    );

    return Ok(());
}

#[test]
fn it_parses_providers() -> Result<()> {
    let matches = build().try_get_matches_from(vec!["ttmdocs", "sources", "browse", "box"])?;
    let chain = matches_chain(&matches);
    assert_eq!(required_provider(chain[2])?, ExternalProvider::Box);

    let res = build().try_get_matches_from(vec!["ttmdocs", "sources", "browse", "dropbox"]);
    assert!(res.is_err());

    return Ok(());
}

#[test]
fn it_requires_something_to_update() {
    let res = build().try_get_matches_from(vec!["ttmdocs", "kb", "update", "kb-1"]);
    assert!(res.is_err());

    let res = build().try_get_matches_from(vec!["ttmdocs", "files", "update", "f-1", "-n", "a.pdf"]);
    assert!(res.is_ok());
}

#[test]
fn it_accepts_repeated_file_ids() -> Result<()> {
    let matches = build().try_get_matches_from(vec![
        "ttmdocs", "chat", "Hello", "-f", "f-1", "-f", "f-2",
    ])?;
    let chain = matches_chain(&matches);
    let file_ids = chain[1]
        .get_many::<String>("file-id")
        .unwrap_or_default()
        .cloned()
        .collect::<Vec<String>>();

    assert_eq!(file_ids, vec!["f-1", "f-2"]);
    assert_eq!(required(chain[1], "message")?, "Hello");
    assert!(required(chain[1], "chat-id").is_err());

    return Ok(());
}
