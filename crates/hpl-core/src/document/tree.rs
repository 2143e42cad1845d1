//! Mapping between the document model and the markup tree.
//!
//! Reading is lenient about layout (an empty element may stand for an empty
//! map) but strict about content: missing required elements, unparsable
//! numbers or timestamps and broken body invariants are parse errors.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::{DateTime, SecondsFormat, Utc};

use super::account::{
    Account, CATEGORY, CREATED_AT, INITIAL, SERIAL_NUMBER, SERVICE_NAME, STANDARD_COLUMNS, STATUS,
    SUMMARY, UPDATED_AT,
};
use super::body::{Body, SequenceEntry};
use super::head::{FileVersion, Head, Options};
use super::table::Table;
use crate::error::{HplError, Result};
use crate::markup::{Map, Value, TEXT_KEY};

pub(crate) const ROOT: &str = "root";
pub(crate) const HEAD: &str = "head";
pub(crate) const BODY: &str = "body";

const FILE_ID: &str = "file_id";
const FILE_VERSION: &str = "file_version";
const FILE_TITLE: &str = "file_title";
const FILE_DESCRIPTION: &str = "file_description";
const HEAD_CREATED_AT: &str = "created_at";
const HEAD_UPDATED_AT: &str = "updated_at";
const IS_ENCRYPTED: &str = "is_encrypted";
const KDF_ITERATIONS: &str = "kdf_iterations";
const OPTIONS: &str = "options";
const COLUMN_ALIAS: &str = "column_alias";
const COLUMN_ORDER: &str = "column_order";
const INVISIBLE_COLUMNS: &str = "invisible_columns";
const COL: &str = "col";
const ID_ATTRIBUTE: &str = "_id";

const SEQUENCE: &str = "sequence";
const TABLES: &str = "tables";
const TABLE: &str = "table";
const THEAD: &str = "thead";
const TBODY: &str = "tbody";
const TABLE_ID: &str = "id";
const ACCOUNT: &str = "ac";

pub(crate) fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(text: &str, path: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| HplError::Parse(format!("invalid timestamp at {}: {}", path, e)))
}

// --- model to tree ---

/// `{root: {head, body}}` ready for the builder.
pub(crate) fn document_value(head: Value, body: Value) -> Value {
    Value::Map(Map::new().with(
        ROOT,
        Value::Map(Map::new().with(HEAD, head).with(BODY, body)),
    ))
}

pub(crate) fn head_to_value(head: &Head) -> Value {
    let mut map = Map::new()
        .with(FILE_ID, Value::text(head.file_id.as_str()))
        .with(FILE_VERSION, Value::text(head.file_version.to_string()))
        .with(FILE_TITLE, Value::text(head.title.as_str()))
        .with(FILE_DESCRIPTION, Value::text(head.description.as_str()))
        .with(HEAD_CREATED_AT, Value::text(format_timestamp(head.created_at)))
        .with(HEAD_UPDATED_AT, Value::text(format_timestamp(head.updated_at)))
        .with(IS_ENCRYPTED, Value::text(head.is_encrypted.to_string()));
    if let (true, Some(iterations)) = (head.is_encrypted, head.kdf_iterations) {
        map.insert(KDF_ITERATIONS, Value::text(iterations.to_string()));
    }
    map.insert(OPTIONS, options_to_value(&head.options));
    Value::Map(map)
}

fn options_to_value(options: &Options) -> Value {
    let alias = options
        .column_alias
        .iter()
        .map(|(key, label)| {
            let mut col = Map::new().with(ID_ATTRIBUTE, Value::text(key.as_str()));
            if !label.is_empty() {
                col.insert(TEXT_KEY, Value::text(label.as_str()));
            }
            Value::Map(col)
        })
        .collect();
    let order = options
        .column_order
        .iter()
        .map(|key| Value::text(key.as_str()))
        .collect();
    let invisible = options
        .invisible_columns
        .iter()
        .map(|key| Value::text(key.as_str()))
        .collect();

    Value::Map(
        Map::new()
            .with(COLUMN_ALIAS, col_list(alias))
            .with(COLUMN_ORDER, col_list(order))
            .with(INVISIBLE_COLUMNS, col_list(invisible)),
    )
}

fn col_list(items: Vec<Value>) -> Value {
    Value::Map(Map::new().with(COL, Value::List(items)))
}

/// Body subtree: `{sequence: {table: [...]}, tables: {table: [...]}}`.
pub(crate) fn body_to_value(body: &Body) -> Value {
    let sequence = body
        .sequence
        .iter()
        .map(|entry| {
            Value::Map(
                Map::new()
                    .with(ID_ATTRIBUTE, Value::text(entry.table_id.as_str()))
                    .with(TEXT_KEY, Value::text(entry.counter.to_string())),
            )
        })
        .collect();
    let tables = body.tables.iter().map(table_to_value).collect();

    Value::Map(
        Map::new()
            .with(SEQUENCE, Value::Map(Map::new().with(TABLE, Value::List(sequence))))
            .with(TABLES, Value::Map(Map::new().with(TABLE, Value::List(tables)))),
    )
}

fn table_to_value(table: &Table) -> Value {
    let thead = Map::new()
        .with(TABLE_ID, Value::text(table.id.as_str()))
        .with(SERVICE_NAME, Value::text(table.name.as_str()))
        .with(SUMMARY, Value::text(table.summary.as_str()))
        .with(CREATED_AT, Value::text(format_timestamp(table.created_at)))
        .with(UPDATED_AT, Value::text(format_timestamp(table.updated_at)));
    let accounts = table.accounts.iter().map(account_to_value).collect();

    Value::Map(
        Map::new()
            .with(THEAD, Value::Map(thead))
            .with(TBODY, Value::Map(Map::new().with(ACCOUNT, Value::List(accounts)))),
    )
}

fn account_to_value(account: &Account) -> Value {
    let mut map = Map::new()
        .with(SERIAL_NUMBER, Value::text(account.serial_number.to_string()))
        .with(SERVICE_NAME, Value::text(account.service_name.as_str()))
        .with(INITIAL, Value::text(account.initial.as_str()))
        .with(CATEGORY, Value::text(account.category.as_str()))
        .with(SUMMARY, Value::text(account.summary.as_str()))
        .with(STATUS, Value::text(account.status.as_str()))
        .with(CREATED_AT, Value::text(format_timestamp(account.created_at)))
        .with(UPDATED_AT, Value::text(format_timestamp(account.updated_at)));
    for (key, value) in &account.fields {
        map.insert(key.as_str(), Value::text(value.as_str()));
    }
    Value::Map(map)
}

// --- tree to model ---

/// A map-shaped element being read, with its path for error messages.
struct Node<'v> {
    map: Option<&'v Map>,
    path: String,
}

impl<'v> Node<'v> {
    fn new(value: &'v Value, path: &str) -> Result<Self> {
        let map = match value {
            Value::Map(map) => Some(map),
            Value::Text(text) if text.trim().is_empty() => None,
            _ => {
                return Err(HplError::Parse(format!(
                    "expected element content at {}",
                    path
                )))
            }
        };
        Ok(Self {
            map,
            path: path.to_string(),
        })
    }

    fn get(&self, key: &str) -> Option<&'v Value> {
        self.map.and_then(|map| map.get(key))
    }

    fn child_path(&self, key: &str) -> String {
        format!("{}.{}", self.path, key)
    }

    fn child(&self, key: &str) -> Result<Node<'v>> {
        let path = self.child_path(key);
        match self.get(key) {
            Some(value) => Node::new(value, &path),
            None => Ok(Node { map: None, path }),
        }
    }

    fn optional_text(&self, key: &str) -> Result<Option<&'v str>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Text(text)) => Ok(Some(text.as_str())),
            Some(_) => Err(HplError::Parse(format!(
                "expected text at {}",
                self.child_path(key)
            ))),
        }
    }

    fn text(&self, key: &str) -> Result<&'v str> {
        self.optional_text(key)?.ok_or_else(|| {
            HplError::Parse(format!("missing element {}", self.child_path(key)))
        })
    }

    /// Items of a repeated element. A lone map is accepted as one item.
    fn list(&self, key: &str) -> &'v [Value] {
        match self.get(key) {
            Some(Value::List(items)) => items.as_slice(),
            Some(value @ Value::Map(_)) => std::slice::from_ref(value),
            _ => &[],
        }
    }
}

fn parse_number<T: std::str::FromStr>(text: &str, path: &str) -> Result<T> {
    text.trim()
        .parse()
        .map_err(|_| HplError::Parse(format!("invalid number '{}' at {}", text, path)))
}

/// Split a parsed document into its head value and body value.
pub(crate) fn split_document(tree: &Value) -> Result<(&Value, &Value)> {
    let root = tree
        .as_map()
        .and_then(|map| map.get(ROOT))
        .and_then(Value::as_map)
        .ok_or_else(|| HplError::Parse("missing <root> element".to_string()))?;
    let head = root
        .get(HEAD)
        .ok_or_else(|| HplError::Parse("missing <head> element".to_string()))?;
    let body = root
        .get(BODY)
        .ok_or_else(|| HplError::Parse("missing <body> element".to_string()))?;
    Ok((head, body))
}

pub(crate) fn head_from_value(value: &Value) -> Result<Head> {
    let node = Node::new(value, "root.head")?;

    let file_id = node.text(FILE_ID)?.trim().to_string();
    if file_id.is_empty() {
        return Err(HplError::Parse("empty root.head.file_id".to_string()));
    }
    let file_version: FileVersion = node.text(FILE_VERSION)?.trim().parse()?;
    let created_at = parse_timestamp(node.text(HEAD_CREATED_AT)?, "root.head.created_at")?;
    let updated_at = parse_timestamp(node.text(HEAD_UPDATED_AT)?, "root.head.updated_at")?;
    let is_encrypted = match node.optional_text(IS_ENCRYPTED)?.map(str::trim) {
        None | Some("") | Some("false") => false,
        Some("true") => true,
        Some(other) => {
            return Err(HplError::Parse(format!(
                "invalid root.head.is_encrypted '{}'",
                other
            )))
        }
    };
    let kdf_iterations = node
        .optional_text(KDF_ITERATIONS)?
        .map(|text| parse_number(text, "root.head.kdf_iterations"))
        .transpose()?;

    Ok(Head {
        file_id,
        file_version,
        title: node.optional_text(FILE_TITLE)?.unwrap_or_default().to_string(),
        description: node
            .optional_text(FILE_DESCRIPTION)?
            .unwrap_or_default()
            .to_string(),
        created_at,
        updated_at,
        is_encrypted,
        kdf_iterations,
        options: options_from_node(&node.child(OPTIONS)?)?,
    })
}

fn options_from_node(node: &Node<'_>) -> Result<Options> {
    let mut options = Options::default();

    let alias = node.child(COLUMN_ALIAS)?;
    for item in alias.list(COL) {
        let col = Node::new(item, &alias.child_path(COL))?;
        let key = col.text(ID_ATTRIBUTE)?.to_string();
        let label = col.optional_text(TEXT_KEY)?.unwrap_or_default().to_string();
        options.column_alias.insert(key, label);
    }

    let order = node.child(COLUMN_ORDER)?;
    for key in column_keys(&order)? {
        if options.column_order.contains(&key) {
            return Err(HplError::Parse(format!(
                "column '{}' listed twice in {}",
                key, order.path
            )));
        }
        options.column_order.push(key);
    }

    let invisible = node.child(INVISIBLE_COLUMNS)?;
    options.invisible_columns = column_keys(&invisible)?.into_iter().collect::<BTreeSet<_>>();

    Ok(options)
}

fn column_keys(node: &Node<'_>) -> Result<Vec<String>> {
    // A lone `<col>` parses as text when the sequence rule is not configured.
    if let Some(Value::Text(key)) = node.get(COL) {
        return Ok(vec![key.clone()]);
    }
    node.list(COL)
        .iter()
        .map(|item| {
            item.as_text().map(str::to_string).ok_or_else(|| {
                HplError::Parse(format!("expected a column key at {}", node.child_path(COL)))
            })
        })
        .collect()
}

/// Read a body subtree (either embedded under `root.body` or a decrypted
/// fragment) and check its invariants.
pub(crate) fn body_from_value(value: &Value) -> Result<Body> {
    let node = Node::new(value, "root.body")?;

    let sequence_node = node.child(SEQUENCE)?;
    let mut sequence = Vec::new();
    for item in sequence_node.list(TABLE) {
        let entry = Node::new(item, &sequence_node.child_path(TABLE))?;
        let table_id = entry.text(ID_ATTRIBUTE)?.to_string();
        let counter = match entry.optional_text(TEXT_KEY)? {
            Some(text) if !text.trim().is_empty() => parse_number(text, &entry.path)?,
            _ => 0,
        };
        sequence.push(SequenceEntry { table_id, counter });
    }

    let tables_node = node.child(TABLES)?;
    let tables = tables_node
        .list(TABLE)
        .iter()
        .map(|item| table_from_value(item, &tables_node.child_path(TABLE)))
        .collect::<Result<Vec<_>>>()?;

    let body = Body { sequence, tables };
    check_body(&body)?;
    Ok(body)
}

fn table_from_value(value: &Value, path: &str) -> Result<Table> {
    let node = Node::new(value, path)?;
    let thead = node.child(THEAD)?;
    let tbody = node.child(TBODY)?;

    let accounts = tbody
        .list(ACCOUNT)
        .iter()
        .map(|item| account_from_value(item, &tbody.child_path(ACCOUNT)))
        .collect::<Result<Vec<_>>>()?;

    Ok(Table {
        id: thead.text(TABLE_ID)?.trim().to_string(),
        name: thead.optional_text(SERVICE_NAME)?.unwrap_or_default().to_string(),
        summary: thead.optional_text(SUMMARY)?.unwrap_or_default().to_string(),
        created_at: parse_timestamp(thead.text(CREATED_AT)?, &thead.child_path(CREATED_AT))?,
        updated_at: parse_timestamp(thead.text(UPDATED_AT)?, &thead.child_path(UPDATED_AT))?,
        accounts,
    })
}

fn account_from_value(value: &Value, path: &str) -> Result<Account> {
    let node = Node::new(value, path)?;
    let required = |key: &str| node.text(key).map(str::to_string);

    let mut fields = BTreeMap::new();
    if let Some(map) = node.map {
        for (key, value) in map.iter() {
            if STANDARD_COLUMNS.contains(&key) {
                continue;
            }
            let text = value.as_text().ok_or_else(|| {
                HplError::Parse(format!("expected text at {}", node.child_path(key)))
            })?;
            fields.insert(key.to_string(), text.to_string());
        }
    }

    Ok(Account {
        serial_number: parse_number(node.text(SERIAL_NUMBER)?, &node.child_path(SERIAL_NUMBER))?,
        service_name: required(SERVICE_NAME)?,
        initial: required(INITIAL)?,
        category: required(CATEGORY)?,
        summary: required(SUMMARY)?,
        status: required(STATUS)?,
        created_at: parse_timestamp(node.text(CREATED_AT)?, &node.child_path(CREATED_AT))?,
        updated_at: parse_timestamp(node.text(UPDATED_AT)?, &node.child_path(UPDATED_AT))?,
        fields,
    })
}

fn check_body(body: &Body) -> Result<()> {
    let mut table_ids = HashSet::new();
    for table in &body.tables {
        if !table_ids.insert(table.id.as_str()) {
            return Err(HplError::Parse(format!("duplicate table id '{}'", table.id)));
        }

        let mut serials = HashSet::new();
        for account in &table.accounts {
            if !serials.insert(account.serial_number) {
                return Err(HplError::Parse(format!(
                    "duplicate serial number {} in table '{}'",
                    account.serial_number, table.id
                )));
            }
        }

        let counter = body.sequence_counter(&table.id).ok_or_else(|| {
            HplError::Parse(format!("table '{}' has no sequence entry", table.id))
        })?;
        if serials.iter().any(|sn| *sn > counter) {
            return Err(HplError::Parse(format!(
                "sequence counter {} of table '{}' is behind its serial numbers",
                counter, table.id
            )));
        }
    }

    let mut sequenced = HashSet::new();
    for entry in &body.sequence {
        if !sequenced.insert(entry.table_id.as_str()) {
            return Err(HplError::Parse(format!(
                "duplicate sequence entry for table '{}'",
                entry.table_id
            )));
        }
        if !table_ids.contains(entry.table_id.as_str()) {
            return Err(HplError::Parse(format!(
                "sequence entry for unknown table '{}'",
                entry.table_id
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{AccountFields, Document};
    use crate::markup::{build, parse, parse_at, BuildOptions, CodecConfig};

    fn sample() -> Document {
        let mut doc = Document::new();
        doc.head_mut().set_title("Personal");
        let mut head = doc.head_mut();
        let mut options = head.options();
        options.set_column_alias("nm", "Service").unwrap();
        options.set_column_order(["st", "nm"]).unwrap();
        options.set_invisible_column("ca").unwrap();

        let id = doc.add_table("Banking", "money").unwrap().id().to_string();
        doc.add_account(
            &id,
            AccountFields::new()
                .service_name("Bank")
                .initial("B")
                .category("finance")
                .summary("")
                .status("active")
                .field("password", "007"),
        )
        .unwrap();
        doc
    }

    fn reread(doc: &Document) -> (Head, Body) {
        let tree = document_value(head_to_value(&doc.head), body_to_value(&doc.body));
        let xml = build(&tree, BuildOptions::pretty()).unwrap();
        let parsed = parse(&xml, &CodecConfig::default()).unwrap();
        let (head, body) = split_document(&parsed).unwrap();
        (head_from_value(head).unwrap(), body_from_value(body).unwrap())
    }

    #[test]
    fn test_document_survives_markup() {
        let doc = sample();
        let (head, body) = reread(&doc);
        assert_eq!(head, doc.head);
        assert_eq!(body, doc.body);
    }

    #[test]
    fn test_empty_document_survives_markup() {
        let doc = Document::new();
        let (head, body) = reread(&doc);
        assert_eq!(head, doc.head);
        assert_eq!(body, doc.body);
    }

    #[test]
    fn test_body_fragment_parses_below_root_body() {
        let doc = sample();
        let fragment = build(&body_to_value(&doc.body), BuildOptions::compact()).unwrap();
        assert!(fragment.starts_with("<sequence>"));

        let value = parse_at(&fragment, "root.body", &CodecConfig::default()).unwrap();
        assert_eq!(body_from_value(&value).unwrap(), doc.body);
    }

    #[test]
    fn test_leading_zeros_preserved() {
        let doc = sample();
        let (_, body) = reread(&doc);
        assert_eq!(body.tables[0].accounts[0].field("password"), Some("007"));
    }

    #[test]
    fn test_kdf_iterations_only_written_when_encrypted() {
        let mut doc = sample();
        doc.head.kdf_iterations = Some(300_000);
        let plain = head_to_value(&doc.head);
        assert!(plain.pointer(KDF_ITERATIONS).is_none());

        doc.head.is_encrypted = true;
        let sealed = head_to_value(&doc.head);
        assert_eq!(sealed.pointer(KDF_ITERATIONS), Some(&Value::text("300000")));
    }

    fn body_xml(inner: &str) -> Result<Body> {
        let value = parse_at(inner, "root.body", &CodecConfig::default())?;
        body_from_value(&value)
    }

    const THEAD_1000: &str = "<thead><id>TBL-1000</id><nm>A</nm><sm/><ca>2024-01-01T00:00:00.000Z</ca><ua>2024-01-01T00:00:00.000Z</ua></thead>";
    const AC_1: &str = "<ac><sn>1</sn><nm>x</nm><it>x</it><ct>x</ct><sm>x</sm><st>x</st><ca>2024-01-01T00:00:00.000Z</ca><ua>2024-01-01T00:00:00.000Z</ua></ac>";

    #[test]
    fn test_body_invariants_checked() {
        let table = format!("<table>{}<tbody>{}</tbody></table>", THEAD_1000, AC_1);

        let ok = format!("<sequence><table id=\"TBL-1000\">1</table></sequence><tables>{}</tables>", table);
        assert!(body_xml(&ok).is_ok());

        let behind = format!("<sequence><table id=\"TBL-1000\">0</table></sequence><tables>{}</tables>", table);
        assert!(matches!(body_xml(&behind), Err(HplError::Parse(_))));

        let unsequenced = format!("<sequence/><tables>{}</tables>", table);
        assert!(body_xml(&unsequenced).is_err());

        let orphan = "<sequence><table id=\"TBL-2000\">0</table></sequence><tables/>";
        assert!(body_xml(orphan).is_err());

        let twice = format!(
            "<sequence><table id=\"TBL-1000\">1</table></sequence><tables>{}{}</tables>",
            table, table
        );
        assert!(body_xml(&twice).unwrap_err().to_string().contains("duplicate table id"));

        let serials = format!(
            "<sequence><table id=\"TBL-1000\">1</table></sequence><tables><table>{}<tbody>{}{}</tbody></table></tables>",
            THEAD_1000, AC_1, AC_1
        );
        assert!(body_xml(&serials).unwrap_err().to_string().contains("duplicate serial"));
    }

    #[test]
    fn test_missing_required_account_element() {
        let broken = AC_1.replace("<st>x</st>", "");
        let xml = format!(
            "<sequence><table id=\"TBL-1000\">1</table></sequence><tables><table>{}<tbody>{}</tbody></table></tables>",
            THEAD_1000, broken
        );
        let err = body_xml(&xml).unwrap_err();
        assert!(err.to_string().contains("root.body.tables.table.tbody.ac.st"));
    }

    #[test]
    fn test_is_encrypted_must_be_boolean() {
        let xml = "<root><head><file_id>HPL-1</file_id><file_version>1.0</file_version>\
                   <created_at>2024-01-01T00:00:00.000Z</created_at>\
                   <updated_at>2024-01-01T00:00:00.000Z</updated_at>\
                   <is_encrypted>yes</is_encrypted><options/></head><body/></root>";
        let tree = parse(xml, &CodecConfig::default()).unwrap();
        let (head, _) = split_document(&tree).unwrap();
        assert!(head_from_value(head).is_err());
    }
}
