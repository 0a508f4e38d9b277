//! Writer for the generated `web_resources.h` header

use std::io::{self, Write};

use super::FileAsset;

const INCLUDE_GUARD: &str = "WEB_RESOURCES_H";

/// Route that is served with the contents of the root `index.html`
const ROOT_ROUTE: &str = "/";
const INDEX_ROUTE: &str = "/index.html";

/// One row of the generated `webResources` table
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ResourceTableEntry<'a> {
    pub route: String,
    pub symbol: &'a str,
    pub len_symbol: String,
    pub byte_len: usize,
    pub mime: &'static str,
}

impl<'a> ResourceTableEntry<'a> {
    fn for_asset(asset: &'a FileAsset, route: String) -> Self {
        ResourceTableEntry {
            route,
            symbol: asset.symbol(),
            len_symbol: asset.len_symbol(),
            byte_len: asset.compressed().len(),
            mime: asset.mime(),
        }
    }
}

/// Builds the table rows for `assets` in order
///
/// The root `index.html` additionally gets a row for `/` right after its own.
pub fn table(assets: &[FileAsset]) -> Vec<ResourceTableEntry<'_>> {
    let mut rows = Vec::with_capacity(assets.len() + 1);

    for asset in assets {
        let route = asset.route();
        let is_index = route == INDEX_ROUTE;

        rows.push(ResourceTableEntry::for_asset(asset, route));

        if is_index {
            rows.push(ResourceTableEntry::for_asset(asset, ROOT_ROUTE.to_string()));
        }
    }

    rows
}

/// Writes the complete header for `assets` to `writer`
pub fn write_to<W: Write>(assets: &[FileAsset], writer: &mut W) -> io::Result<()> {
    writeln!(writer, "// Generated file - do not edit")?;
    writeln!(writer, "#ifndef {}", INCLUDE_GUARD)?;
    writeln!(writer, "#define {}", INCLUDE_GUARD)?;
    writeln!(writer)?;
    writeln!(writer, "#include <Arduino.h>")?;
    writeln!(writer)?;

    for asset in assets {
        write_asset(asset, writer)?;
    }

    writeln!(writer, "struct WebResource {{")?;
    writeln!(writer, "  const char* url;")?;
    writeln!(writer, "  const uint8_t* data;")?;
    writeln!(writer, "  uint32_t len;")?;
    writeln!(writer, "  const char* mime;")?;
    writeln!(writer, "}};")?;
    writeln!(writer)?;

    let rows = table(assets);

    writeln!(writer, "const WebResource webResources[] PROGMEM = {{")?;
    for row in &rows {
        writeln!(
            writer,
            "  {{ \"{}\", {}, {}, \"{}\" }},",
            c_escape(&row.route),
            row.symbol,
            row.len_symbol,
            row.mime
        )?;
    }
    writeln!(writer, "}};")?;
    writeln!(writer)?;

    writeln!(writer, "const uint16_t webResourcesCount = {};", rows.len())?;
    writeln!(writer)?;
    writeln!(writer, "#endif")?;

    Ok(())
}

/// Writes the byte array and length constant for a single asset
fn write_asset<W: Write>(asset: &FileAsset, writer: &mut W) -> io::Result<()> {
    write!(writer, "const uint8_t {}[] PROGMEM = {{ ", asset.symbol())?;

    for (idx, byte) in asset.compressed().iter().enumerate() {
        if idx > 0 {
            writer.write_all(b", ")?;
        }

        write!(writer, "0x{:02x}", byte)?;
    }

    writeln!(writer, " }};")?;
    writeln!(
        writer,
        "const uint32_t {} = {};",
        asset.len_symbol(),
        asset.compressed().len()
    )?;
    writeln!(writer)?;

    Ok(())
}

fn c_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::Version;

    fn asset(path: &str, content: &[u8]) -> FileAsset {
        FileAsset::new(path, content.to_vec(), &Version::new("1.0.0")).unwrap()
    }

    fn render(assets: &[FileAsset]) -> String {
        let mut buf: Vec<u8> = Vec::new();
        write_to(assets, &mut buf).unwrap();

        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn it_should_alias_root_index_page() {
        let assets = vec![asset("app.js", b"1"), asset("index.html", b"<html>")];
        let rows = table(&assets);

        let routes: Vec<&str> = rows.iter().map(|row| row.route.as_str()).collect();
        assert_eq!(routes, vec!["/app.js", "/index.html", "/"]);
        assert_eq!(rows[1].symbol, rows[2].symbol);
        assert_eq!(rows[2].byte_len, assets[1].compressed().len());
    }

    #[test]
    fn it_should_not_alias_nested_index_pages() {
        let assets = vec![asset("setup/index.html", b"<html>")];

        assert_eq!(table(&assets).len(), 1);
    }

    #[test]
    fn it_should_frame_output_with_include_guards() {
        let out = render(&[asset("app.css", b"body{}")]);

        assert!(out.starts_with("// Generated file - do not edit\n#ifndef WEB_RESOURCES_H\n#define WEB_RESOURCES_H\n"));
        assert!(out.trim_end().ends_with("#endif"));
        assert_eq!(out.matches("#ifndef").count(), 1);
    }

    #[test]
    fn it_should_emit_lowercase_hex_byte_array() {
        let css = asset("app.css", b"body{}");
        let out = render(std::slice::from_ref(&css));

        let bytes: Vec<String> = css
            .compressed()
            .iter()
            .map(|b| format!("0x{:02x}", b))
            .collect();
        let expected = format!(
            "const uint8_t PAGE_APP_CSS[] PROGMEM = {{ {} }};\nconst uint32_t PAGE_APP_CSS_LEN = {};\n",
            bytes.join(", "),
            css.compressed().len()
        );

        assert!(out.contains(&expected));
        assert!(out.contains("0x1f, 0x8b, 0x08"));
    }

    #[test]
    fn it_should_emit_table_rows_and_count() {
        let assets = vec![asset("index.html", b"<html>"), asset("css/app.css", b"a{}")];
        let out = render(&assets);

        assert!(out.contains("struct WebResource {\n  const char* url;\n  const uint8_t* data;\n  uint32_t len;\n  const char* mime;\n};\n"));
        assert!(out.contains(
            "  { \"/index.html\", PAGE_INDEX_HTML, PAGE_INDEX_HTML_LEN, \"text/html\" },\n  { \"/\", PAGE_INDEX_HTML, PAGE_INDEX_HTML_LEN, \"text/html\" },\n  { \"/css/app.css\", PAGE_CSS_APP_CSS, PAGE_CSS_APP_CSS_LEN, \"text/css\" },\n"
        ));
        assert!(out.contains("const uint16_t webResourcesCount = 3;"));
    }

    #[test]
    fn it_should_render_empty_table() {
        let out = render(&[]);

        assert!(out.contains("const WebResource webResources[] PROGMEM = {\n};"));
        assert!(out.contains("const uint16_t webResourcesCount = 0;"));
    }

    #[test]
    fn it_should_escape_routes() {
        assert_eq!(c_escape("/a\"b\\c"), "/a\\\"b\\\\c");
    }
}
