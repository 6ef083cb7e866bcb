//! Manifest Builder
//!
//! Emits `imsmanifest.xml`. Pure string transform: the schema block comes from
//! the version's [`ScormDialect`], the `<file>` listing from the
//! [`AssetManifest`].

use lazy_static::lazy_static;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::assets::{AssetManifest, INDEX_HTML};
use crate::scorm::ScormDialect;

lazy_static! {
    static ref NON_IDENT: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
    static ref FILE_HREF: Regex = Regex::new(r#"<file\s+href="([^"]*)"\s*/>"#).unwrap();
}

const IDENTIFIER_STEM_LEN: usize = 50;

/// Characters XML 1.0 admits in a document (`Char` production).
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r')
        || matches!(c, '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}')
        || c >= '\u{10000}'
}

/// Escape the five XML special characters and drop characters XML cannot carry.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars().filter(|c| is_xml_char(*c)) {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Derive the package identifier from the course title.
///
/// The suffix is the generation timestamp when one is supplied, otherwise a
/// short SHA-256 of the title so that repeated builds are byte-identical.
pub fn package_identifier(title: &str, timestamp: Option<u64>) -> String {
    let lowered = title.to_lowercase();
    let stem = NON_IDENT.replace_all(&lowered, "_");
    let stem: String = stem.trim_matches('_').chars().take(IDENTIFIER_STEM_LEN).collect();
    let stem = if stem.is_empty() { "course".to_string() } else { stem };

    let suffix = match timestamp {
        Some(ts) => ts.to_string(),
        None => {
            let mut hasher = Sha256::new();
            hasher.update(title.as_bytes());
            let digest = format!("{:x}", hasher.finalize());
            digest[..8].to_string()
        }
    };

    format!("course_{}_{}", stem, suffix)
}

pub fn build_manifest(
    title: &str,
    identifier: &str,
    dialect: &dyn ScormDialect,
    assets: &AssetManifest,
) -> String {
    let escaped_title = escape_xml(title);
    let escaped_id = escape_xml(identifier);

    let files = assets
        .package_files()
        .iter()
        .map(|f| format!("      <file href=\"{}\"/>", escape_xml(f)))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<manifest identifier="{id}" version="1.0"
  {namespaces}>
  <metadata>
    <schema>ADL SCORM</schema>
    <schemaversion>{schema_version}</schemaversion>
  </metadata>
  <organizations default="org_{id}">
    <organization identifier="org_{id}">
      <title>{title}</title>
      <item identifier="item_{id}" identifierref="res_{id}">
        <title>{title}</title>
      </item>
    </organization>
  </organizations>
  <resources>
    <resource identifier="res_{id}" type="webcontent" {sco_type} href="{launch}">
{files}
    </resource>
  </resources>
</manifest>
"#,
        id = escaped_id,
        namespaces = dialect.manifest_namespaces(),
        schema_version = dialect.schema_version(),
        title = escaped_title,
        sco_type = dialect.sco_type_attribute(),
        launch = INDEX_HTML,
        files = files,
    )
}

/// The `href` of every `<file>` element, in document order.
pub fn manifest_files(manifest: &str) -> Vec<String> {
    FILE_HREF
        .captures_iter(manifest)
        .map(|cap| cap[1].to_string())
        .collect()
}
