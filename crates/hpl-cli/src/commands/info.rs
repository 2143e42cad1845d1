use hpl_core::{DocumentStore, FileStore, HplError};

use crate::app::{missing_document_message, AppContext};
use crate::output::{info_json, print_info};

/// Show head metadata. Only reads the clear-text head, so no passphrase is
/// needed; the table count is shown for plain documents.
pub fn handle_info(ctx: &AppContext<'_>, json: bool) -> anyhow::Result<()> {
    let path = ctx.document_path()?;
    let markup = match FileStore::new(&path).load_markup() {
        Ok(markup) => markup,
        Err(HplError::NotFound(_)) => return Err(anyhow::anyhow!(missing_document_message(&path))),
        Err(err) => return Err(err.into()),
    };

    let engine = ctx.engine();
    let head = engine.read_head(&markup)?;
    let tables = if engine.is_plain_xml(&markup) {
        Some(engine.import(&markup, None, None)?.body().tables().len())
    } else {
        None
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info_json(&path, &head, tables))?);
    } else {
        print_info(&path, &head, tables);
    }
    Ok(())
}
