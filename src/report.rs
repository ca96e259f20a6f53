// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! 启动时打印给操作者的 URL 清单。

use std::fmt::Write;
use std::path::Path;

use crate::{alias::AliasTable, util::quote_path};

pub const RUNNING_NOTICE: &str = "Server running. Press Ctrl+C to stop.";
pub const SHUTDOWN_NOTICE: &str = "Shutting down.";

pub fn render_urls(root: &Path, base_urls: &[String], table: &AliasTable) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Serving directory: {}", root.display());
    let _ = writeln!(out, "Base URLs:");
    for base in base_urls {
        let _ = writeln!(out, "- {}/", base);
    }

    if table.is_empty() {
        let _ = writeln!(out, "\nNo files found to serve.");
        return out;
    }

    let _ = writeln!(out, "\nSimple test URLs (use these in app):");
    for alias in table.iter() {
        let encoded_alias = quote_path(alias.key().trim_start_matches('/'));
        for base in base_urls {
            let _ = writeln!(out, "- {}/{} -> {}", base, encoded_alias, alias.relative_path());
        }
    }

    let _ = writeln!(out, "\nDirect file URLs:");
    for alias in table.iter() {
        let encoded_rel = quote_path(alias.relative_path());
        for base in base_urls {
            let _ = writeln!(out, "- {}/{}", base, encoded_rel);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::FileEntry;

    #[test]
    fn test_render_with_aliases() {
        let table = AliasTable::build(vec![
            FileEntry::new("clips/a.mp4"),
            FileEntry::new("clips/sub/b c.mkv"),
        ]);
        let bases = vec![
            "http://127.0.0.1:8788".to_string(),
            "http://192.168.1.23:8788".to_string(),
        ];
        let out = render_urls(Path::new("/srv/sample_files"), &bases, &table);

        let expected = "\
Serving directory: /srv/sample_files
Base URLs:
- http://127.0.0.1:8788/
- http://192.168.1.23:8788/

Simple test URLs (use these in app):
- http://127.0.0.1:8788/1.mp4 -> clips/a.mp4
- http://192.168.1.23:8788/1.mp4 -> clips/a.mp4
- http://127.0.0.1:8788/2.mkv -> clips/sub/b c.mkv
- http://192.168.1.23:8788/2.mkv -> clips/sub/b c.mkv

Direct file URLs:
- http://127.0.0.1:8788/clips/a.mp4
- http://192.168.1.23:8788/clips/a.mp4
- http://127.0.0.1:8788/clips/sub/b%20c.mkv
- http://192.168.1.23:8788/clips/sub/b%20c.mkv
";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_render_empty_table() {
        let table = AliasTable::default();
        let bases = vec!["http://192.0.2.5:9000".to_string()];
        let out = render_urls(Path::new("/srv/empty"), &bases, &table);

        assert!(out.ends_with("- http://192.0.2.5:9000/\n\nNo files found to serve.\n"));
        assert!(!out.contains("Simple test URLs"));
    }
}
