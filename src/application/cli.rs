#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use std::io;
use std::io::Write;
use std::path;
use std::sync::Arc;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::ArgGroup;
use clap::ArgMatches;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;
use dialoguer::Select;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use yansi::Paint;

use super::views;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ApiBox;
use crate::domain::models::AppAction;
use crate::domain::models::ExternalProvider;
use crate::domain::models::FileUpdate;
use crate::domain::models::KnowledgeBaseCreate;
use crate::domain::models::KnowledgeBaseUpdate;
use crate::domain::models::LlmModelDescriptor;
use crate::domain::models::LocalFile;
use crate::domain::models::ProgressFn;
use crate::domain::models::QueryKey;
use crate::domain::models::UploadResult;
use crate::domain::services::augment_catalog;
use crate::domain::services::parse_callback_query;
use crate::domain::services::source_statuses;
use crate::domain::services::AppStore;
use crate::domain::services::BoxUpload;
use crate::domain::services::BrowseOutcome;
use crate::domain::services::ChatService;
use crate::domain::services::FileIngestion;
use crate::domain::services::FileService;
use crate::domain::services::GoogleDriveUpload;
use crate::domain::services::KnowledgeBaseService;
use crate::domain::services::LocalUpload;
use crate::domain::services::OAuthFlow;
use crate::domain::services::OAuthState;
use crate::domain::services::ProviderBrowser;
use crate::domain::services::QueryCache;
use crate::domain::services::SendMessage;
use crate::domain::services::UploadOrigin;
use crate::infrastructure::api::HttpApi;
use crate::infrastructure::storage::FileStorage;

/// Shared handles for one command run.
struct Context {
    api: ApiBox,
    cache: Arc<QueryCache>,
    cancel: CancellationToken,
}

impl Context {
    fn new() -> Context {
        return Context {
            api: Arc::new(HttpApi::default()),
            cache: Arc::new(QueryCache::default()),
            cancel: CancellationToken::new(),
        };
    }

    fn store(&self) -> AppStore<FileStorage> {
        return AppStore::new(FileStorage::default());
    }

    async fn catalog(&self) -> Result<Vec<LlmModelDescriptor>> {
        let api = self.api.clone();
        let res = self
            .cache
            .fetch(&QueryKey::llm_catalog(), &self.cancel, || {
                return async move { return api.llm_catalog().await };
            })
            .await?;

        return Ok(augment_catalog(&res));
    }

    async fn find_model(&self, text: &str) -> Result<LlmModelDescriptor> {
        let catalog = self.catalog().await?;
        if let Some(model) = catalog.iter().find(|e| return e.matches(text)) {
            return Ok(model.clone());
        }

        bail!(format!(
            "Unknown model '{text}'. Run `ttmdocs models list` to see available models."
        ));
    }
}

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    std::process::exit(0);
}

fn progress_printer() -> ProgressFn {
    return Arc::new(|pct| {
        eprint!("\rUploading... {pct}%");
        if pct == 100 {
            eprintln!();
        }
        io::stderr().flush().unwrap_or_default();
    });
}

fn print_upload_results(results: &[UploadResult]) {
    for result in results {
        println!("{}", views::format_upload_result(result));
    }
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(config_file_path.clone()).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

async fn send_once(chat: &ChatService, req: SendMessage) -> Result<String> {
    let res = chat.send_message(req).await?;
    println!("{}", views::format_message(&res.reply));
    if let Some(route) = &res.navigate_to {
        println!("{}", Paint::new(views::format_route(route)).dimmed());
    }
    tracing::debug!(chat_id = res.chat_id.as_str(), "Message sent");

    return Ok(res.chat_id);
}

async fn chat(ctx: &Context, matches: &ArgMatches) -> Result<()> {
    let store = ctx.store();
    let model = match matches.get_one::<String>("model") {
        Some(text) => ctx.find_model(text).await?,
        None => store.state().selected_model.clone(),
    };
    let knowledge_base_id = matches
        .get_one::<String>("knowledge-base")
        .cloned()
        .or_else(|| {
            return store
                .state()
                .selected_knowledge_base
                .as_ref()
                .map(|kb| return kb.uuid.to_string());
        });
    let file_ids = matches
        .get_many::<String>("file-id")
        .map(|ids| return ids.cloned().collect::<Vec<String>>())
        .unwrap_or_default();

    let service = ChatService::new(ctx.api.clone(), ctx.cache.clone());
    let mut chat_id = matches.get_one::<String>("chat-id").cloned();

    let build_req = |text: &str, chat_id: &Option<String>| {
        let mut req = SendMessage::new(text, model.clone());
        req.chat_id = chat_id.clone();
        req.knowledge_base_id = knowledge_base_id.clone();
        req.file_ids = file_ids.clone();
        return req;
    };

    if let Some(message) = matches.get_one::<String>("message") {
        send_once(&service, build_req(message, &chat_id)).await?;
        return Ok(());
    }

    println!(
        "Chatting with {}. Send an empty message or /quit to exit.",
        Paint::new(&model.name).bold()
    );
    loop {
        let text: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("You")
            .allow_empty(true)
            .interact_text()?;
        if text.trim().is_empty() || text.trim() == "/quit" {
            break;
        }
        service.compose(chat_id.as_deref(), &text);

        match send_once(&service, build_req(&text, &chat_id)).await {
            Ok(id) => chat_id = Some(id),
            Err(err) => {
                eprintln!("{}", Paint::red(format!("{err}")));
                eprintln!("{}", views::format_phase(service.phase(chat_id.as_deref())));
            }
        }
    }

    return Ok(());
}

async fn chats(ctx: &Context, matches: &ArgMatches) -> Result<()> {
    let service = ChatService::new(ctx.api.clone(), ctx.cache.clone());

    match matches.subcommand() {
        Some(("list", _)) => {
            let sessions = service.list_chats(&ctx.cancel).await?;
            println!("{}", views::format_sessions(&sessions));
        }
        Some(("messages", sub_matches)) => {
            let id = required(sub_matches, "id")?;
            let messages = service.chat_messages(&id, &ctx.cancel).await?;
            println!("{}", views::format_messages(&messages));
        }
        Some(("rename", sub_matches)) => {
            let id = required(sub_matches, "id")?;
            let name = required(sub_matches, "name")?;
            let session = service.rename_chat(&id, &name).await?;
            println!("{}", views::format_session(&session));
        }
        Some(("delete", sub_matches)) => {
            let id = required(sub_matches, "id")?;
            service.delete_chat(&id).await?;
            println!("Deleted chat {id}");
        }
        _ => {
            subcommand_chats().print_long_help()?;
        }
    }

    return Ok(());
}

async fn models(ctx: &Context, matches: &ArgMatches) -> Result<()> {
    let mut store = ctx.store();

    match matches.subcommand() {
        Some(("list", _)) => {
            let catalog = ctx.catalog().await?;
            let state = store.dispatch(AppAction::SetAvailableModels(catalog.clone()))?;
            println!("{}", views::format_models(&catalog, &state.selected_model));
        }
        Some(("select", sub_matches)) => {
            let model = ctx.find_model(&required(sub_matches, "model")?).await?;
            store.dispatch(AppAction::SetSelectedModel(model.clone()))?;
            println!("Selected {}", views::format_model(&model, true).trim());
        }
        _ => {
            subcommand_models().print_long_help()?;
        }
    }

    return Ok(());
}

async fn knowledge_bases(ctx: &Context, matches: &ArgMatches) -> Result<()> {
    let service = KnowledgeBaseService::new(ctx.api.clone(), ctx.cache.clone());
    let mut store = ctx.store();

    match matches.subcommand() {
        Some(("list", _)) => {
            let knowledge_bases = service.list(&ctx.cancel).await?;
            println!(
                "{}",
                views::format_knowledge_bases(
                    &knowledge_bases,
                    store.state().selected_knowledge_base.as_ref()
                )
            );
        }
        Some(("show", sub_matches)) => {
            let knowledge_base = service.get(&required(sub_matches, "id")?, &ctx.cancel).await?;
            println!("{}", views::format_knowledge_base_detail(&knowledge_base));
        }
        Some(("create", sub_matches)) => {
            let req = KnowledgeBaseCreate {
                title: required(sub_matches, "title")?,
                description: sub_matches
                    .get_one::<String>("description")
                    .cloned()
                    .unwrap_or_default(),
                path: sub_matches.get_one::<String>("path").cloned(),
            };
            let knowledge_base = service.create(&req).await?;
            println!("Created {}", views::format_knowledge_base(&knowledge_base, false).trim());
        }
        Some(("update", sub_matches)) => {
            let id = required(sub_matches, "id")?;
            let req = KnowledgeBaseUpdate {
                title: sub_matches.get_one::<String>("title").cloned(),
                description: sub_matches.get_one::<String>("description").cloned(),
            };
            let knowledge_base = service.update(&id, &req).await?;
            println!("Updated {}", views::format_knowledge_base(&knowledge_base, false).trim());
        }
        Some(("delete", sub_matches)) => {
            let id = required(sub_matches, "id")?;
            service.delete(&id).await?;
            let is_selected = store
                .state()
                .selected_knowledge_base
                .as_ref()
                .map(|kb| return kb.uuid == id)
                .unwrap_or(false);
            if is_selected {
                store.dispatch(AppAction::SetSelectedKnowledgeBase(None))?;
            }
            println!("Deleted knowledge base {id}");
        }
        Some(("select", sub_matches)) => {
            if sub_matches.get_flag("clear") {
                store.dispatch(AppAction::SetSelectedKnowledgeBase(None))?;
                println!("Cleared the selected knowledge base");
                return Ok(());
            }

            let knowledge_base = match sub_matches.get_one::<String>("id") {
                Some(id) => (*service.get(id, &ctx.cancel).await?).clone(),
                None => {
                    let knowledge_bases = service.list(&ctx.cancel).await?;
                    if knowledge_bases.is_empty() {
                        println!("{}", views::format_knowledge_bases(&[], None));
                        return Ok(());
                    }
                    let items = knowledge_bases
                        .iter()
                        .map(|e| return views::format_knowledge_base(e, false).trim().to_string())
                        .collect::<Vec<String>>();
                    let idx = Select::with_theme(&ColorfulTheme::default())
                        .with_prompt("Which knowledge base would you like to chat with?")
                        .default(0)
                        .items(&items)
                        .interact_opt()?;
                    match idx {
                        Some(idx) => knowledge_bases[idx].clone(),
                        None => return Ok(()),
                    }
                }
            };

            store.dispatch(AppAction::SetSelectedKnowledgeBase(Some(knowledge_base.clone())))?;
            println!("Selected {}", views::format_knowledge_base(&knowledge_base, true));
        }
        _ => {
            subcommand_knowledge_bases().print_long_help()?;
        }
    }

    return Ok(());
}

fn target_knowledge_base(matches: &ArgMatches) -> Option<String> {
    return matches.get_one::<String>("knowledge-base").cloned();
}

async fn files(ctx: &Context, matches: &ArgMatches) -> Result<()> {
    let service = FileService::new(ctx.api.clone(), ctx.cache.clone());

    match matches.subcommand() {
        Some(("list", sub_matches)) => {
            let kb = target_knowledge_base(sub_matches);
            let files = service.list(kb.as_deref(), &ctx.cancel).await?;
            println!("{}", views::format_files(&files));
        }
        Some(("show", sub_matches)) => {
            let include_content = sub_matches.get_flag("content");
            let file = service
                .get(&required(sub_matches, "id")?, include_content, &ctx.cancel)
                .await?;
            if include_content {
                println!("{}", views::format_file_content(&file));
            } else {
                println!("{}", views::format_file(&file));
            }
        }
        Some(("upload", sub_matches)) => {
            let mut local_files = vec![];
            for file_path in sub_matches.get_many::<String>("paths").unwrap_or_default() {
                local_files.push(LocalFile::from_path(path::Path::new(file_path)).await?);
            }

            let kb = target_knowledge_base(sub_matches);
            let origin = LocalUpload { files: local_files };
            let ingestion = FileIngestion::new(ctx.api.clone(), ctx.cache.clone());
            let results = ingestion
                .ingest(&origin, kb.as_deref(), Some(progress_printer()), &ctx.cancel)
                .await?;
            print_upload_results(&results);
        }
        Some(("import", sub_matches)) => {
            let provider = required_provider(sub_matches)?;
            let file_id = required(sub_matches, "file-id")?;
            let kb = target_knowledge_base(sub_matches);
            import_external(ctx, provider, &file_id, kb.as_deref()).await?;
        }
        Some(("update", sub_matches)) => {
            let id = required(sub_matches, "id")?;
            let req = FileUpdate {
                filename: sub_matches.get_one::<String>("name").cloned(),
                knowledge_base_uuid: target_knowledge_base(sub_matches),
            };
            let file = service.update(&id, &req).await?;
            println!("Updated {}", views::format_file(&file));
        }
        Some(("delete", sub_matches)) => {
            let id = required(sub_matches, "id")?;
            service.delete(&id).await?;
            println!("Deleted file {id}");
        }
        _ => {
            subcommand_files().print_long_help()?;
        }
    }

    return Ok(());
}

async fn import_external(
    ctx: &Context,
    provider: ExternalProvider,
    file_id: &str,
    knowledge_base_id: Option<&str>,
) -> Result<()> {
    let origin: Box<dyn UploadOrigin + Send + Sync> = match provider {
        ExternalProvider::Google => Box::new(GoogleDriveUpload {
            file_id: file_id.to_string(),
        }),
        ExternalProvider::Box => Box::new(BoxUpload {
            file_id: file_id.to_string(),
        }),
    };

    println!("Importing {}...", origin.describe());
    let ingestion = FileIngestion::new(ctx.api.clone(), ctx.cache.clone());
    let results = ingestion
        .ingest(origin.as_ref(), knowledge_base_id, None, &ctx.cancel)
        .await?;
    print_upload_results(&results);

    return Ok(());
}

async fn browse(ctx: &Context, provider: ExternalProvider, knowledge_base_id: Option<&str>) -> Result<()> {
    let mut browser = ProviderBrowser::new(provider);

    loop {
        let listing = browser.load(&ctx.cache, &ctx.api, &ctx.cancel).await;
        let entries = browser.filtered(&listing);

        let mut items = vec![];
        items.push(if browser.search.is_empty() {
            "Search...".to_string()
        } else {
            format!("Search... (current: {})", browser.search)
        });
        if !browser.is_root() {
            items.push("Back to root".to_string());
        }
        let offset = items.len();
        items.extend(entries.iter().map(|e| return views::format_external_file(e)));

        let idx = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("{} files", provider.display_name()))
            .default(0)
            .items(&items)
            .interact_opt()?;

        let idx = match idx {
            Some(idx) => idx,
            None => return Ok(()),
        };

        if idx == 0 {
            let search: String = Input::with_theme(&ColorfulTheme::default())
                .with_prompt("Search")
                .allow_empty(true)
                .interact_text()?;
            browser.set_search(&search);
            continue;
        }
        if idx < offset {
            browser.reset();
            continue;
        }

        let entry = entries[idx - offset];
        match browser.select(&entry) {
            BrowseOutcome::OpenFolder(_) => continue,
            BrowseOutcome::Upload(file_id) => {
                import_external(ctx, provider, &file_id, knowledge_base_id).await?;
                return Ok(());
            }
            BrowseOutcome::Inert => {
                println!("{} is a web link and cannot be imported.", entry.name);
            }
        }
    }
}

async fn sources(ctx: &Context, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("list", _)) => {
            let flow = OAuthFlow::new(ctx.api.clone(), ctx.cache.clone(), &Config::get(ConfigKey::AppURL));
            let providers = flow.available_providers(&ctx.cancel).await?;

            let api = ctx.api.clone();
            let user = ctx
                .cache
                .fetch(&QueryKey::current_user(), &ctx.cancel, || {
                    return async move { return api.current_user().await };
                })
                .await?;

            for status in source_statuses(&providers, Some(user.as_ref())) {
                println!("{}", views::format_source_status(&status));
            }
        }
        Some(("browse", sub_matches)) => {
            let provider = required_provider(sub_matches)?;
            let kb = target_knowledge_base(sub_matches);
            browse(ctx, provider, kb.as_deref()).await?;
        }
        _ => {
            subcommand_sources().print_long_help()?;
        }
    }

    return Ok(());
}

async fn oauth(ctx: &Context, matches: &ArgMatches) -> Result<()> {
    let mut flow = OAuthFlow::new(ctx.api.clone(), ctx.cache.clone(), &Config::get(ConfigKey::AppURL));

    match matches.subcommand() {
        Some(("connect", sub_matches)) => {
            let provider_id = required(sub_matches, "provider-id")?;
            let redirect_uri = flow.redirect_uri();
            if let OAuthState::Redirecting { url } = flow.authorize(&provider_id).await? {
                println!("Open the following URL to connect your account:\n\n{url}");
                println!(
                    "\nOnce redirected to {redirect_uri}, pass the full URL to `ttmdocs oauth callback`."
                );
            }
        }
        Some(("callback", sub_matches)) => {
            let params = parse_callback_query(&required(sub_matches, "query")?);
            let route = flow.handle_callback(&params).await;
            println!("{}", views::format_route(&route));
        }
        _ => {
            subcommand_oauth().print_long_help()?;
        }
    }

    return Ok(());
}

fn required(matches: &ArgMatches, id: &str) -> Result<String> {
    if let Some(val) = matches.get_one::<String>(id) {
        return Ok(val.to_string());
    }

    bail!(format!("Missing required argument '{id}'"));
}

fn required_provider(matches: &ArgMatches) -> Result<ExternalProvider> {
    let text = required(matches, "provider")?;
    if let Some(provider) = ExternalProvider::parse(&text) {
        return Ok(provider);
    }

    bail!(format!(
        "Unknown provider '{text}'. Possible values are: {}",
        ExternalProvider::VARIANTS.join(", ")
    ));
}

fn arg_id(help: &'static str) -> Arg {
    return Arg::new("id").help(help).required(true).num_args(1);
}

fn arg_knowledge_base(help: &'static str) -> Arg {
    return Arg::new("knowledge-base")
        .short('k')
        .long("knowledge-base")
        .help(help)
        .num_args(1);
}

fn arg_provider() -> Arg {
    return Arg::new("provider")
        .help("Document source provider.")
        .required(true)
        .value_parser(PossibleValuesParser::new(ExternalProvider::VARIANTS.to_vec()));
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_chat() -> Command {
    return Command::new("chat")
        .about("Chat with your documents. Omit the message to start an interactive chat.")
        .arg(Arg::new("message").help("Message to send.").num_args(1))
        .arg(
            Arg::new("chat-id")
                .short('i')
                .long("chat-id")
                .help("Continue an existing chat. A new chat is created when omitted.")
                .num_args(1),
        )
        .arg(
            Arg::new("model")
                .short('m')
                .long("model")
                .help("Model to answer with. Defaults to the selected model.")
                .num_args(1),
        )
        .arg(arg_knowledge_base(
            "Knowledge base to ground answers in. Defaults to the selected knowledge base.",
        ))
        .arg(
            Arg::new("file-id")
                .short('f')
                .long("file-id")
                .help("File to attach as context. Can be repeated.")
                .action(ArgAction::Append),
        );
}

fn subcommand_chats() -> Command {
    return Command::new("chats")
        .about("Manage previous chats.")
        .arg_required_else_help(true)
        .subcommand(Command::new("list").about("List all chats."))
        .subcommand(
            Command::new("messages")
                .about("Print the messages of a chat.")
                .arg(arg_id("Chat ID")),
        )
        .subcommand(
            Command::new("rename")
                .about("Rename a chat.")
                .arg(arg_id("Chat ID"))
                .arg(Arg::new("name").help("New name").required(true)),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a chat.")
                .arg(arg_id("Chat ID")),
        );
}

fn subcommand_models() -> Command {
    return Command::new("models")
        .about("List and select models.")
        .arg_required_else_help(true)
        .subcommand(Command::new("list").about("List available models. The selected model is marked."))
        .subcommand(
            Command::new("select")
                .about("Select the model used for new messages.")
                .arg(
                    Arg::new("model")
                        .help("Model ID, LLM ID or name.")
                        .required(true),
                ),
        );
}

fn subcommand_knowledge_bases() -> Command {
    return Command::new("kb")
        .about("Manage knowledge bases.")
        .arg_required_else_help(true)
        .subcommand(Command::new("list").about("List knowledge bases. The selected knowledge base is marked."))
        .subcommand(
            Command::new("show")
                .about("Show a knowledge base and its files.")
                .arg(arg_id("Knowledge base ID")),
        )
        .subcommand(
            Command::new("create")
                .about("Create a knowledge base.")
                .arg(
                    Arg::new("title")
                        .short('t')
                        .long("title")
                        .help("Title")
                        .required(true),
                )
                .arg(
                    Arg::new("description")
                        .short('d')
                        .long("description")
                        .help("Description"),
                )
                .arg(Arg::new("path").long("path").help("Storage path")),
        )
        .subcommand(
            Command::new("update")
                .about("Update a knowledge base's title or description.")
                .arg(arg_id("Knowledge base ID"))
                .arg(Arg::new("title").short('t').long("title").help("New title"))
                .arg(
                    Arg::new("description")
                        .short('d')
                        .long("description")
                        .help("New description"),
                )
                .group(
                    ArgGroup::new("update-args")
                        .args(["title", "description"])
                        .multiple(true)
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a knowledge base.")
                .arg(arg_id("Knowledge base ID")),
        )
        .subcommand(
            Command::new("select")
                .about("Select the knowledge base used for new messages. Omit the ID for an interactive selection.")
                .arg(Arg::new("id").help("Knowledge base ID").num_args(1))
                .arg(
                    Arg::new("clear")
                        .long("clear")
                        .help("Clear the selection.")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("id"),
                ),
        );
}

fn subcommand_files() -> Command {
    return Command::new("files")
        .about("Manage uploaded files.")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("list")
                .about("List files.")
                .arg(arg_knowledge_base("Only list files in this knowledge base.")),
        )
        .subcommand(
            Command::new("show")
                .about("Show a file.")
                .arg(arg_id("File ID"))
                .arg(
                    Arg::new("content")
                        .long("content")
                        .help("Include the extracted content.")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("upload")
                .about("Upload local files. Supported types are pdf, docx, pptx, txt, md and csv.")
                .arg(
                    Arg::new("paths")
                        .help("Files to upload.")
                        .required(true)
                        .action(ArgAction::Append),
                )
                .arg(arg_knowledge_base("Add the files to this knowledge base.")),
        )
        .subcommand(
            Command::new("import")
                .about("Import a file from a connected source.")
                .arg(arg_provider())
                .arg(
                    Arg::new("file-id")
                        .help("The provider's file ID.")
                        .required(true),
                )
                .arg(arg_knowledge_base("Add the file to this knowledge base.")),
        )
        .subcommand(
            Command::new("update")
                .about("Rename a file or move it to another knowledge base.")
                .arg(arg_id("File ID"))
                .arg(Arg::new("name").short('n').long("name").help("New file name"))
                .arg(arg_knowledge_base("Move the file to this knowledge base."))
                .group(
                    ArgGroup::new("update-args")
                        .args(["name", "knowledge-base"])
                        .multiple(true)
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a file.")
                .arg(arg_id("File ID")),
        );
}

fn subcommand_sources() -> Command {
    return Command::new("sources")
        .about("Connected document sources.")
        .arg_required_else_help(true)
        .subcommand(Command::new("list").about("List available sources and whether they are connected."))
        .subcommand(
            Command::new("browse")
                .about("Interactively browse a connected source and import a file.")
                .arg(arg_provider())
                .arg(arg_knowledge_base("Add the imported file to this knowledge base.")),
        );
}

fn subcommand_oauth() -> Command {
    return Command::new("oauth")
        .about("Connect document sources.")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("connect")
                .about("Start connecting a source. Prints the URL to authorize at.")
                .arg(
                    Arg::new("provider-id")
                        .help("Provider ID as listed by `ttmdocs sources list`.")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("callback")
                .about("Finish connecting a source from the URL or query string the provider redirected to.")
                .arg(
                    Arg::new("query")
                        .help("Callback URL or query string.")
                        .required(true),
                ),
        );
}

fn arg_config(key: ConfigKey, env: &'static str, help: &str) -> Arg {
    let default = Config::default(key);
    let help = if default.is_empty() {
        help.to_string()
    } else {
        format!("{help} [default: {default}]")
    };

    return Arg::new(key.to_string())
        .long(key.to_string())
        .env(env)
        .num_args(1)
        .help(help)
        .global(true);
}

pub fn build() -> Command {
    let about = format!(
        "{}\n\nVersion: {}\nCommit: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
        option_env!("VERGEN_GIT_DESCRIBE").unwrap_or("unknown")
    );

    return Command::new("ttmdocs")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .arg_required_else_help(true)
        .subcommand(subcommand_chat())
        .subcommand(subcommand_chats())
        .subcommand(subcommand_models())
        .subcommand(subcommand_knowledge_bases())
        .subcommand(subcommand_files())
        .subcommand(subcommand_sources())
        .subcommand(subcommand_oauth())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(Command::new("manpages").about("Generates manpages and outputs to stdout."))
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("TTMDOCS_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        )
        .arg(arg_config(
            ConfigKey::ApiURL,
            "TTMDOCS_API_URL",
            "Talk to My Docs backend URL.",
        ))
        .arg(arg_config(
            ConfigKey::AppURL,
            "TTMDOCS_APP_URL",
            "Frontend URL that OAuth providers redirect back to.",
        ))
        .arg(arg_config(
            ConfigKey::ApiToken,
            "TTMDOCS_API_TOKEN",
            "Bearer token sent with every request. Intended for testing.",
        ))
        .arg(arg_config(
            ConfigKey::DevUserEmail,
            "TTMDOCS_DEV_USER_EMAIL",
            "Email sent as the X-User-Email header to act as a user. Intended for testing.",
        ))
        .arg(arg_config(
            ConfigKey::CacheStaleSeconds,
            "TTMDOCS_CACHE_STALE_SECONDS",
            "Seconds before cached server data is refetched.",
        ))
        .arg(arg_config(
            ConfigKey::RequestTimeoutSeconds,
            "TTMDOCS_REQUEST_TIMEOUT_SECONDS",
            "Seconds to wait for the backend before a request fails.",
        ))
        .arg(arg_config(
            ConfigKey::StorageFile,
            "TTMDOCS_STORAGE_FILE",
            "Path to the file persisting the selected model and knowledge base.",
        ));
}

/// Every `ArgMatches` from the root to the invoked leaf subcommand.
fn matches_chain(matches: &ArgMatches) -> Vec<&ArgMatches> {
    let mut res = vec![matches];
    let mut current = matches;
    while let Some((_, sub_matches)) = current.subcommand() {
        res.push(sub_matches);
        current = sub_matches;
    }

    return res;
}

pub async fn parse() -> Result<()> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
            return Ok(());
        }
        Some(("config", subcmd_matches)) => {
            match subcmd_matches.subcommand() {
                Some(("create", _)) => create_config_file().await?,
                Some(("default", _)) => println!("{}", Config::serialize_default(build())),
                Some(("path", _)) => println!("{}", Config::default(ConfigKey::ConfigFile)),
                _ => subcommand_config().print_long_help()?,
            }
            return Ok(());
        }
        Some(("manpages", _)) => {
            clap_mangen::Man::new(build()).render(&mut io::stdout())?;
            return Ok(());
        }
        _ => {}
    }

    Config::load(build(), matches_chain(&matches)).await?;
    let ctx = Context::new();

    match matches.subcommand() {
        Some(("chat", subcmd_matches)) => chat(&ctx, subcmd_matches).await?,
        Some(("chats", subcmd_matches)) => chats(&ctx, subcmd_matches).await?,
        Some(("models", subcmd_matches)) => models(&ctx, subcmd_matches).await?,
        Some(("kb", subcmd_matches)) => knowledge_bases(&ctx, subcmd_matches).await?,
        Some(("files", subcmd_matches)) => files(&ctx, subcmd_matches).await?,
        Some(("sources", subcmd_matches)) => sources(&ctx, subcmd_matches).await?,
        Some(("oauth", subcmd_matches)) => oauth(&ctx, subcmd_matches).await?,
        _ => build().print_long_help()?,
    }

    return Ok(());
}
