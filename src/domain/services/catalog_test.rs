use super::augment_catalog;
use crate::domain::models::LlmModelDescriptor;
use crate::domain::models::AGENT_MODEL_ID;

fn model(id: &str, is_active: bool, is_deprecated: bool) -> LlmModelDescriptor {
    return LlmModelDescriptor {
        name: id.to_uppercase(),
        model: id.to_string(),
        llm_id: id.to_string(),
        is_active,
        is_deprecated,
    };
}

#[test]
fn it_puts_the_agent_first() {
    let res = augment_catalog(&[model("gpt-4o", true, false), model("claude", true, false)]);

    assert_eq!(res.len(), 3);
    assert!(res[0].is_agent());
    assert_eq!(res[1].model, "gpt-4o");
    assert_eq!(res[2].model, "claude");
}

#[test]
fn it_drops_inactive_and_deprecated_models() {
    let res = augment_catalog(&[
        model("gpt-4o", true, false),
        model("old", true, true),
        model("off", false, false),
    ]);

    let ids = res.iter().map(|e| return e.model.as_str()).collect::<Vec<&str>>();
    assert_eq!(ids, vec![AGENT_MODEL_ID, "gpt-4o"]);
}

#[test]
fn it_is_idempotent() {
    let once = augment_catalog(&[model("gpt-4o", true, false)]);
    let twice = augment_catalog(&once);

    assert_eq!(once, twice);
    assert_eq!(
        twice.iter().filter(|e| return e.is_agent()).count(),
        1
    );
}

#[test]
fn it_replaces_server_entries_with_the_agent_id() {
    let res = augment_catalog(&[model(AGENT_MODEL_ID, true, false)]);

    assert_eq!(res, vec![LlmModelDescriptor::agent()]);
}
