use std::{
    io::{self, Write},
    process,
    sync::Arc,
};

use mosaic::{
    application::{
        api::{ContentApi, RecordedResponse, RequestContext},
        error::AppError,
        pipeline::{ROOT_FAILURE_STATUS, Renderer},
        registry::{self, TemplateRegistry},
        session::RenderOptions,
    },
    config,
    infra::{error::InfraError, fs_api::FsContentApi, telemetry},
    templates,
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Templates(config::TemplatesArgs::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    let mut registry = TemplateRegistry::new();
    templates::register_stock(&mut registry)?;
    let registry = registry::install(registry)?;

    match command {
        config::Command::Render(args) => run_render(settings, registry, args).await,
        config::Command::Templates(_) => run_templates(&registry),
    }
}

async fn run_render(
    settings: config::Settings,
    registry: Arc<TemplateRegistry>,
    args: config::RenderArgs,
) -> Result<(), AppError> {
    let api = Arc::new(FsContentApi::new(settings.content.directory.clone()));
    let page = api
        .fetch_page(&args.page_id)
        .await?
        .ok_or_else(|| AppError::PageNotFound(args.page_id.clone()))?;

    let url = args
        .url
        .clone()
        .or_else(|| page.url.clone())
        .unwrap_or_else(|| format!("/{}", page.id));
    let response = Arc::new(RecordedResponse::new());
    let request = RequestContext::new(url).with_hooks(response.clone());

    let renderer = Renderer::new(registry).with_options(RenderOptions::from(&settings.render));
    let body = renderer
        .render_page(api, request, &page, &args.extension, args.mode)
        .await?;

    let meta = response.snapshot();
    if meta.status == Some(ROOT_FAILURE_STATUS) {
        return Err(AppError::RootFailed { page: page.id });
    }

    match args.output.as_ref() {
        Some(path) => tokio::fs::write(path, body.as_bytes())
            .await
            .map_err(InfraError::from)?,
        None => io::stdout()
            .lock()
            .write_all(body.as_bytes())
            .map_err(InfraError::from)?,
    }

    info!(
        target = "mosaic::render",
        page = %page.id,
        extension = %args.extension,
        mode = args.mode.as_str(),
        bytes = body.len(),
        headers = ?meta.headers,
        "page written"
    );
    Ok(())
}

fn run_templates(registry: &TemplateRegistry) -> Result<(), AppError> {
    let mut out = io::stdout().lock();
    for descriptor in registry.templates() {
        writeln!(
            out,
            "{}\t{}\tareas=[{}]\tcss=[{}]\tjs=[{}]",
            descriptor.key(),
            descriptor.kind().as_str(),
            descriptor.areas().join(","),
            descriptor.css_block_names().join(","),
            descriptor.js_block_names().join(",")
        )
        .map_err(InfraError::from)?;
    }
    Ok(())
}
