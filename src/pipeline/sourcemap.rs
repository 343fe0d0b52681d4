// src/pipeline/sourcemap.rs

//! Minimal source map (v3) support for line-granular concatenation.

use serde::{Deserialize, Serialize};

use crate::errors::Result;

const BASE64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// A version 3 source map as written next to a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u8,
    pub file: String,
    pub sources: Vec<String>,
    pub sources_content: Vec<String>,
    pub names: Vec<String>,
    pub mappings: String,
}

impl SourceMap {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| anyhow::Error::from(e).into())
    }

    /// Trailing comment that points a bundle at its map file.
    pub fn url_comment(map_file_name: &str, extension: Option<&str>) -> String {
        match extension {
            Some("css") => format!("\n/*# sourceMappingURL={map_file_name} */\n"),
            _ => format!("\n//# sourceMappingURL={map_file_name}\n"),
        }
    }
}

/// Append `value` as a base64 VLQ.
pub fn encode_vlq(value: i64, out: &mut String) {
    let mut vlq: u64 = if value < 0 {
        ((value.unsigned_abs()) << 1) | 1
    } else {
        (value as u64) << 1
    };

    loop {
        let mut digit = (vlq & 0b1_1111) as usize;
        vlq >>= 5;
        if vlq > 0 {
            digit |= 0b10_0000;
        }
        out.push(BASE64[digit] as char);
        if vlq == 0 {
            break;
        }
    }
}

/// Builds a map in which every generated line maps column 0 to column 0 of
/// one original line.
#[derive(Debug, Default)]
pub struct SourceMapBuilder {
    file: String,
    sources: Vec<String>,
    contents: Vec<String>,
    lines: Vec<(usize, usize)>,
}

impl SourceMapBuilder {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            ..Self::default()
        }
    }

    /// Register a source and return its index.
    pub fn add_source(&mut self, path: impl Into<String>, content: impl Into<String>) -> usize {
        self.sources.push(path.into());
        self.contents.push(content.into());
        self.sources.len() - 1
    }

    /// Next generated line comes from `line` of `source`.
    pub fn map_line(&mut self, source: usize, line: usize) {
        self.lines.push((source, line));
    }

    pub fn build(self) -> SourceMap {
        let mut mappings = String::new();
        let mut prev_source = 0i64;
        let mut prev_line = 0i64;

        for (idx, &(source, source_line)) in self.lines.iter().enumerate() {
            if idx > 0 {
                mappings.push(';');
            }
            let (source, source_line) = (source as i64, source_line as i64);
            encode_vlq(0, &mut mappings);
            encode_vlq(source - prev_source, &mut mappings);
            encode_vlq(source_line - prev_line, &mut mappings);
            encode_vlq(0, &mut mappings);
            prev_source = source;
            prev_line = source_line;
        }

        SourceMap {
            version: 3,
            file: self.file,
            sources: self.sources,
            sources_content: self.contents,
            names: Vec::new(),
            mappings,
        }
    }
}
