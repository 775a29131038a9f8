//! Source map helpers: identity maps, inline comments and the combined map
//! written after concatenated output.

use anyhow::{Context, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use log::trace;
use sourcemap::{SourceMap, SourceMapBuilder};

const COMMENT_PREFIX: &str = "//# sourceMappingURL=";
const LEGACY_COMMENT_PREFIX: &str = "//@ sourceMappingURL=";
const DATA_URL_PREFIX: &str = "data:application/json;charset=utf-8;base64,";

/// Number of lines a code block occupies, counted as the length of its
/// newline split.
pub fn line_count(code: &str) -> u32 {
    code.split('\n').count() as u32
}

/// Maps every line of `code` onto the same line of `source`.
pub fn identity_map(source: &str, code: &str) -> SourceMap {
    let mut builder = SourceMapBuilder::new(None);
    let src_id = builder.add_source(source);
    builder.set_source_contents(src_id, Some(code));
    for line in 0..line_count(code) {
        builder.add_raw(line, 0, line, 0, Some(src_id), None, false);
    }
    builder.into_sourcemap()
}

/// Renders a map as an inline `sourceMappingURL` comment.
pub fn to_comment(map: &SourceMap) -> Result<String> {
    let mut bytes = Vec::new();
    map.to_writer(&mut bytes).context("Failed to serialize source map")?;
    Ok(format!("{}{}{}", COMMENT_PREFIX, DATA_URL_PREFIX, STANDARD.encode(bytes)))
}

/// Splits a trailing inline base64 source map comment off `code`.
///
/// Returns `None` when the code carries no inline map. External map URLs are
/// not followed.
pub fn extract_inline_map(code: &str) -> Result<Option<(String, SourceMap)>> {
    let trimmed = code.trim_end();
    let line_start = trimmed.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let last_line = &trimmed[line_start..];

    let Some(url) = last_line
        .strip_prefix(COMMENT_PREFIX)
        .or_else(|| last_line.strip_prefix(LEGACY_COMMENT_PREFIX))
    else {
        return Ok(None);
    };
    let Some(payload) = url.strip_prefix("data:application/json").and_then(|rest| {
        rest.find("base64,").map(|idx| &rest[idx + "base64,".len()..])
    }) else {
        trace!("Ignoring non-inline source map URL: {}", url);
        return Ok(None);
    };

    let json = STANDARD.decode(payload.trim()).context("Invalid base64 in inline source map")?;
    let map = SourceMap::from_slice(&json).context("Invalid inline source map")?;
    let stripped = trimmed[..line_start].trim_end_matches('\n').to_string();
    Ok(Some((stripped, map)))
}

/// Accumulates the maps of concatenated files, each shifted down by the line
/// offset it was registered at.
pub struct CombinedSourceMap {
    builder: SourceMapBuilder,
    offsets: Vec<u32>,
}

impl Default for CombinedSourceMap {
    fn default() -> Self {
        Self::new()
    }
}

impl CombinedSourceMap {
    pub fn new() -> Self {
        Self { builder: SourceMapBuilder::new(None), offsets: Vec::new() }
    }

    pub fn add_file(&mut self, map: &SourceMap, line_offset: u32) {
        trace!("Adding source map with {} tokens at line {}", map.get_token_count(), line_offset);

        let mut source_ids = Vec::new();
        for (idx, source) in map.sources().enumerate() {
            let id = self.builder.add_source(source);
            if let Some(contents) = map.get_source_contents(idx as u32) {
                self.builder.set_source_contents(id, Some(contents));
            }
            source_ids.push(id);
        }
        let name_ids: Vec<u32> = map.names().map(|name| self.builder.add_name(name)).collect();

        for token in map.tokens() {
            self.builder.add_raw(
                token.get_dst_line() + line_offset,
                token.get_dst_col(),
                token.get_src_line(),
                token.get_src_col(),
                source_ids.get(token.get_src_id() as usize).copied(),
                name_ids.get(token.get_name_id() as usize).copied(),
                false,
            );
        }
        self.offsets.push(line_offset);
    }

    /// Line offsets in registration order.
    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    pub fn finish(self) -> (SourceMap, Vec<u32>) {
        (self.builder.into_sourcemap(), self.offsets)
    }
}
