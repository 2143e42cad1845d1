use std::path::PathBuf;

use hpl_core::Document;

use crate::app::{resolve_config_path, save_document, AppContext, OpenDocument};
use crate::cli::InitArgs;
use crate::config::{default_document_path, write_config, HplConfig};
use crate::helpers::prompt_new_passphrase;

pub fn handle_init(ctx: &AppContext<'_>, args: &InitArgs) -> anyhow::Result<()> {
    let path = match args.path.as_deref().or(ctx.cli().file.as_deref()) {
        Some(path) => PathBuf::from(path),
        None => match ctx.config().document.path.as_deref() {
            Some(path) => PathBuf::from(path),
            None => default_document_path()?,
        },
    };
    if path.exists() {
        return Err(anyhow::anyhow!(
            "Document already exists at {}",
            path.display()
        ));
    }

    let passphrase = if args.encrypt {
        Some(prompt_new_passphrase("HPL_PASSPHRASE", ctx.interactive())?)
    } else {
        None
    };

    let mut document = Document::new();
    {
        let mut head = document.head_mut();
        if let Some(title) = &args.title {
            head.set_title(title.as_str());
        }
        if let Some(description) = &args.description {
            head.set_description(description.as_str());
        }
    }

    let mut open = OpenDocument::new(path, document, passphrase);
    save_document(ctx.engine(), &mut open)?;

    let config_path = resolve_config_path()?;
    if !config_path.exists() {
        write_config(&config_path, &HplConfig::with_document(open.path()))?;
    }

    if !ctx.quiet() {
        println!(
            "Created {} document {} at {}",
            if open.passphrase.is_some() { "encrypted" } else { "plain" },
            open.document.file_id(),
            open.path().display()
        );
    }
    Ok(())
}
