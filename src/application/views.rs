#[cfg(test)]
#[path = "views_test.rs"]
mod tests;

use chrono::DateTime;
use chrono::NaiveDateTime;
use yansi::Paint;

use crate::domain::models::ChatMessage;
use crate::domain::models::ChatSession;
use crate::domain::models::ExternalFile;
use crate::domain::models::ExternalFileType;
use crate::domain::models::FileRecord;
use crate::domain::models::KnowledgeBase;
use crate::domain::models::LlmModelDescriptor;
use crate::domain::models::Role;
use crate::domain::models::Route;
use crate::domain::models::SourceStatus;
use crate::domain::models::UploadResult;
use crate::domain::services::ChatPhase;

const MAX_LINE_LENGTH: usize = 70;

fn first_line(text: &str) -> String {
    let line = text.split('\n').next().unwrap_or_default().trim().to_string();
    if line.chars().count() >= MAX_LINE_LENGTH {
        let truncated = line.chars().take(MAX_LINE_LENGTH - 3).collect::<String>();
        return format!("{truncated}...");
    }

    return line;
}

/// Renders backend timestamps, with or without an offset, as
/// `YYYY-MM-DD HH:MM`. Unparseable values are shown as is.
fn format_timestamp(timestamp: &str) -> String {
    if let Ok(date) = DateTime::parse_from_rfc3339(timestamp) {
        return date.format("%Y-%m-%d %H:%M").to_string();
    }
    if let Ok(date) = NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f") {
        return date.format("%Y-%m-%d %H:%M").to_string();
    }

    return timestamp.to_string();
}

fn marker(selected: bool) -> String {
    if selected {
        return Paint::green("*").bold().to_string();
    }
    return " ".to_string();
}

pub fn format_session(session: &ChatSession) -> String {
    let mut res = format!(
        "- (ID: {}) {}, Updated: {}",
        session.uuid,
        first_line(&session.name),
        format_timestamp(&session.updated_at)
    );

    if let Some(model) = &session.model {
        res = format!("{res}, Model: {model}");
    }

    return res;
}

pub fn format_sessions(sessions: &[ChatSession]) -> String {
    if sessions.is_empty() {
        return "There are no chats yet. Send a message to start one!".to_string();
    }

    return sessions
        .iter()
        .map(format_session)
        .collect::<Vec<String>>()
        .join("\n");
}

pub fn format_message(message: &ChatMessage) -> String {
    let author = match message.role {
        Role::User => Paint::cyan("You").bold().to_string(),
        Role::Assistant => Paint::magenta("Assistant").bold().to_string(),
    };

    let mut res = format!("{author}: {}", message.content.trim());
    if message.has_error() {
        let error = message.error.as_deref().unwrap_or_default();
        res = format!("{res}\n{}", Paint::red(format!("Error: {error}")));
    }
    if message.in_progress == Some(true) {
        res = format!("{res}\n{}", Paint::yellow("(still processing)"));
    } else if message.is_local() {
        res = format!("{res}\n{}", Paint::yellow("(sending)"));
    }

    return res;
}

pub fn format_messages(messages: &[ChatMessage]) -> String {
    if messages.is_empty() {
        return "This chat has no messages.".to_string();
    }

    return messages
        .iter()
        .map(format_message)
        .collect::<Vec<String>>()
        .join("\n\n");
}

pub fn format_phase(phase: ChatPhase) -> String {
    return match phase {
        ChatPhase::Submitting => Paint::yellow("Sending...").to_string(),
        ChatPhase::Failed => Paint::red("Failed to send, your message was not saved.").to_string(),
        _ => phase.to_string(),
    };
}

pub fn format_model(model: &LlmModelDescriptor, selected: bool) -> String {
    return format!("{} {} ({})", marker(selected), model.name, model.model);
}

pub fn format_models(models: &[LlmModelDescriptor], selected: &LlmModelDescriptor) -> String {
    return models
        .iter()
        .map(|model| return format_model(model, model == selected))
        .collect::<Vec<String>>()
        .join("\n");
}

pub fn format_knowledge_base(knowledge_base: &KnowledgeBase, selected: bool) -> String {
    return format!(
        "{} (ID: {}) {}, Files: {}, Tokens: {}",
        marker(selected),
        knowledge_base.uuid,
        knowledge_base.title,
        knowledge_base.files.len(),
        knowledge_base.token_count
    );
}

pub fn format_knowledge_bases(
    knowledge_bases: &[KnowledgeBase],
    selected: Option<&KnowledgeBase>,
) -> String {
    if knowledge_bases.is_empty() {
        return "There are no knowledge bases yet.".to_string();
    }

    return knowledge_bases
        .iter()
        .map(|e| {
            let is_selected = selected.map(|kb| return kb.uuid == e.uuid).unwrap_or(false);
            return format_knowledge_base(e, is_selected);
        })
        .collect::<Vec<String>>()
        .join("\n");
}

pub fn format_knowledge_base_detail(knowledge_base: &KnowledgeBase) -> String {
    let mut lines = vec![
        Paint::new(&knowledge_base.title).bold().to_string(),
        knowledge_base.description.to_string(),
        format!("ID: {}", knowledge_base.uuid),
        format!("Tokens: {}", knowledge_base.token_count),
        format!("Updated: {}", format_timestamp(&knowledge_base.updated_at)),
    ];

    if knowledge_base.files.is_empty() {
        lines.push("No files.".to_string());
    } else {
        lines.push("Files:".to_string());
        for file in knowledge_base.files.iter() {
            lines.push(format!(
                "  - (ID: {}) {}, Tokens: {}",
                file.uuid, file.filename, file.size_tokens
            ));
        }
    }

    return lines.join("\n");
}

pub fn format_file(file: &FileRecord) -> String {
    let mut res = format!("- (ID: {}) {}, Source: {}", file.uuid, file.filename, file.source);
    if let Some(size) = file.size_bytes {
        res = format!("{res}, Size: {size} bytes");
    }

    return res;
}

pub fn format_files(files: &[FileRecord]) -> String {
    if files.is_empty() {
        return "There are no files.".to_string();
    }

    return files
        .iter()
        .map(format_file)
        .collect::<Vec<String>>()
        .join("\n");
}

pub fn format_file_content(file: &FileRecord) -> String {
    let content = match &file.encoded_content {
        Some(content) if file.has_content() => content,
        _ => return format!("{}\nNo extracted content.", format_file(file)),
    };

    let pages = content
        .iter()
        .map(|(page, text)| {
            return format!("{}\n{}", Paint::new(format!("Page {page}")).bold(), text.trim());
        })
        .collect::<Vec<String>>()
        .join("\n\n");

    return format!("{}\n\n{pages}", format_file(file));
}

pub fn format_upload_result(result: &UploadResult) -> String {
    let record = match result {
        UploadResult::Uploaded(record) => record,
        UploadResult::Failed { filename, error } => {
            return format!("{} {filename}: {error}", Paint::red("Failed"));
        }
    };

    let res = format!("{} {}", Paint::green("Uploaded"), format_file(record));
    if let Some(content) = record.encoded_content.as_ref() {
        if record.has_content() {
            return format!("{res}, Pages: {}", content.len());
        }
    }

    return res;
}

pub fn format_external_file(file: &ExternalFile) -> String {
    let kind = match file.file_type {
        ExternalFileType::Folder => "[folder]",
        ExternalFileType::File => "[file]",
        ExternalFileType::WebLink => "[link]",
    };

    return format!("{kind} {}", file.name);
}

pub fn format_source_status(status: &SourceStatus) -> String {
    let name = status
        .provider
        .name
        .clone()
        .unwrap_or_else(|| return status.provider.id.to_string());
    let connected = if status.is_connected {
        Paint::green("connected").to_string()
    } else {
        Paint::red("not connected").to_string()
    };

    return format!("- (ID: {}) {name}: {connected}", status.provider.id);
}

pub fn format_route(route: &Route) -> String {
    return format!("Navigate to {}", route.to_path());
}
