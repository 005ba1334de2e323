use once_cell::sync::Lazy;
use regex::Regex;

/// `import ... from "<path>"` / `export ... from "<path>"` statements.
/// The clause before `from` is arbitrary (default, namespace, named);
/// both quote styles are accepted.
static IMPORT_FROM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:import|export)\s+[^'";]*?from\s*['"]([^'"]+)['"]"#)
        .expect("import-from pattern is valid")
});

/// Side-effect imports: `import "<path>"`.
static IMPORT_BARE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"import\s*['"]([^'"]+)['"]"#).expect("bare-import pattern is valid"));

/// CommonJS `require("<path>")` calls.
static REQUIRE_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"require\s*\(\s*['"]([^'"]+)['"]\s*\)"#).expect("require pattern is valid")
});

/// Lexical scanner for raw import path strings.
///
/// Only relative imports (`./`, `../`) are retained; package and alias
/// imports are out of scope for the dependency graph. The scan never
/// fails: text without recognizable imports yields an empty sequence.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportExtractor;

impl ImportExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Extract every relative import path from `source`, in source order.
    ///
    /// Duplicates are preserved; the graph builder collapses them at edge
    /// insertion. False negatives (dynamic imports, aliased paths) are an
    /// accepted limitation of the lexical approach.
    #[must_use]
    pub fn extract(&self, source: &str) -> Vec<String> {
        let mut found: Vec<(usize, String)> = Vec::new();

        for pattern in [&*IMPORT_FROM, &*IMPORT_BARE, &*REQUIRE_CALL] {
            for captures in pattern.captures_iter(source) {
                let whole = captures.get(0).map_or(0, |m| m.start());
                if let Some(path) = captures.get(1) {
                    found.push((whole, path.as_str().to_string()));
                }
            }
        }

        // Union of the independent patterns, restored to source order.
        // IMPORT_FROM and IMPORT_BARE can both hit an `import "x"`
        // statement, so identical (offset, path) pairs collapse.
        found.sort();
        found.dedup();

        found
            .into_iter()
            .map(|(_, path)| path)
            .filter(|path| Self::is_relative(path))
            .collect()
    }

    fn is_relative(path: &str) -> bool {
        path.starts_with("./") || path.starts_with("../")
    }
}
