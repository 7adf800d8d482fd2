use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use lazy_regex::{lazy_regex, Regex};

use super::assets::BITS_STDCPP_H_SORTED_HEADERS;
use crate::errors::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderSearchMode {
    /// Representation for angle-bracket include (#include <...>)
    OnlyLibraryDirs,

    /// Representation for double-quote include (#include "...")
    CurrentDirFirst,
}

static RE_INCLUDE_ANGLE_BRA: lazy_regex::Lazy<Regex> = lazy_regex!(r#"^\s*#\s*include\s*<(.+)>"#);
static RE_INCLUDE_DBL_QUOTE: lazy_regex::Lazy<Regex> = lazy_regex!(r#"^\s*#\s*include\s*"(.+)""#);
static RE_PRAGMA_ONCE: lazy_regex::Lazy<Regex> = lazy_regex!(r#"^\s*#\s*pragma\s+once"#);

fn extract_include_argument(line: &str) -> Option<(String, HeaderSearchMode)> {
    RE_INCLUDE_ANGLE_BRA
        .captures(line)
        .map(|cap| (cap[1].trim().to_owned(), HeaderSearchMode::OnlyLibraryDirs))
        .or_else(|| {
            RE_INCLUDE_DBL_QUOTE
                .captures(line)
                .map(|cap| (cap[1].trim().to_owned(), HeaderSearchMode::CurrentDirFirst))
        })
}

#[derive(Debug, Clone)]
struct IncludeDirective {
    written: String,
    mode: HeaderSearchMode,
    /// Set when the header was found (and therefore inlined) somewhere.
    inlined_from: Option<PathBuf>,
}

#[derive(Debug, PartialEq, Eq, Clone)]
enum Resolution {
    AlreadyInlined(PathBuf),

    /// .1 = header_content
    MustBeInlined(PathBuf, String),

    NotFound,
}

/// Inlines library headers into a single translation unit.
///
/// Headers that cannot be found in the including file's directory (for quoted
/// includes) or in any library dir are kept as `#include` lines, deduplicated
/// and hoisted to the top of the generated code.
#[derive(Debug, Clone, Default)]
pub struct Expander {
    library_dirs: Vec<PathBuf>,
    directives: Vec<IncludeDirective>,
    inlined_headers: HashSet<PathBuf>,
    found_bits_stdcpp_h: bool,
    body: String,
}

impl Expander {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn library_dirs(mut self, dirs: &[PathBuf]) -> Self {
        self.library_dirs = dirs
            .iter()
            .filter_map(|dir| match fsutil::canonicalize_path(dir) {
                Ok(dir) => Some(dir),
                Err(e) => {
                    log::warn!("Ignoring library dir: {}", e);
                    None
                }
            })
            .collect();
        self
    }

    pub fn expand(
        mut self,
        source_code_dir: impl AsRef<Path>,
        source_code: impl AsRef<str>,
    ) -> Result<String> {
        let dir = fsutil::canonicalize_path(&source_code_dir)?;
        self.emit(&dir, source_code.as_ref());
        Ok(self.generated_code())
    }

    pub fn generated_code(&self) -> String {
        let mut s = String::with_capacity(256 + self.body.len());
        let mut kept_headers: HashSet<&str> = HashSet::with_capacity(self.directives.len());

        if self.found_bits_stdcpp_h {
            s += "#include <bits/stdc++.h>\n";
            kept_headers.insert("bits/stdc++.h");
            kept_headers.extend(BITS_STDCPP_H_SORTED_HEADERS.iter().copied());
        }

        for d in &self.directives {
            if d.inlined_from.is_some() || !kept_headers.insert(&d.written) {
                continue;
            }
            use HeaderSearchMode::*;
            s += &match d.mode {
                OnlyLibraryDirs => format!("#include <{}>\n", d.written),
                CurrentDirFirst => format!("#include \"{}\"\n", d.written),
            };
        }

        s.push('\n');
        s += &self.body;
        s
    }

    fn emit(&mut self, abs_cwd: &Path, source_code: &str) {
        for line in source_code.lines() {
            if RE_PRAGMA_ONCE.is_match(line) {
                continue;
            }

            let Some((written, mode)) = self::extract_include_argument(line) else {
                self.body += line;
                self.body.push('\n');
                continue;
            };

            if written == "bits/stdc++.h" {
                self.found_bits_stdcpp_h = true;
                continue;
            }

            let inlined_from = match self.resolve(abs_cwd, &written, mode) {
                Resolution::AlreadyInlined(path) => Some(path),
                Resolution::MustBeInlined(path, content) => {
                    log::debug!("Inlining {:?}", path);
                    self.inlined_headers.insert(path.clone());
                    let dir = path.parent().unwrap_or(abs_cwd).to_owned();
                    self.emit(&dir, &content);
                    Some(path)
                }
                Resolution::NotFound => None,
            };

            self.directives.push(IncludeDirective {
                written,
                mode,
                inlined_from,
            });
        }
    }

    fn resolve(&self, abs_cwd: &Path, written: &str, mode: HeaderSearchMode) -> Resolution {
        let cwd = match mode {
            HeaderSearchMode::CurrentDirFirst => Some(abs_cwd),
            HeaderSearchMode::OnlyLibraryDirs => None,
        };

        for dir in cwd.into_iter().chain(self.library_dirs.iter().map(PathBuf::as_path)) {
            let path = fsutil::normalize_path(dir.join(written));
            if self.inlined_headers.contains(&path) {
                return Resolution::AlreadyInlined(path);
            }
            if !path.is_file() {
                continue;
            }
            match fsutil::read_to_string(&path) {
                Ok(content) => return Resolution::MustBeInlined(path, content),
                Err(e) => log::warn!("Keeping #include of unreadable header: {}", e),
            }
        }
        Resolution::NotFound
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn keeps_unresolved_includes_once_and_folds_into_bits_stdcpp_h() {
        let cwd = tempfile::tempdir().unwrap();
        let generated = Expander::new()
            .expand(
                cwd.path(),
                r#"#include <iostream>
#include <cstdio>
#include <cstdio>
#include <vector>
#include "foo/bar.hpp"
# include<hello/world>
#include <bits/stdc++.h>
#include <bits/stdc++.h>
#include <algorithm>
# include"nyan"
# include"nyan"
#include "chrono"
#include <hoge>
using namespace std;

int main() {
    cout << "Hello world!" << endl;
}
"#,
            )
            .unwrap();

        assert_eq!(
            generated,
            r#"#include <bits/stdc++.h>
#include "foo/bar.hpp"
#include <hello/world>
#include "nyan"
#include <hoge>

using namespace std;

int main() {
    cout << "Hello world!" << endl;
}
"#
        );
    }

    #[test]
    fn inlines_library_headers_once() {
        let lib = tempfile::tempdir().unwrap();
        fsutil::write_with_mkdir(
            lib.path().join("ds/union_find.hpp"),
            "#pragma once\n#include \"../util.hpp\"\n#include <vector>\nstruct UnionFind {};\n",
        )
        .unwrap();
        fsutil::write_with_mkdir(
            lib.path().join("util.hpp"),
            "#pragma once\nusing ll = long long;\n",
        )
        .unwrap();

        let cwd = tempfile::tempdir().unwrap();
        let generated = Expander::new()
            .library_dirs(&[lib.path().to_owned()])
            .expand(
                cwd.path(),
                "#include <vector>\n#include <ds/union_find.hpp>\n#include <util.hpp>\n#include <ds/union_find.hpp>\nint main() {}\n",
            )
            .unwrap();

        assert_eq!(
            generated,
            "#include <vector>\n\nusing ll = long long;\nstruct UnionFind {};\nint main() {}\n"
        );
    }

    #[test]
    fn quoted_include_prefers_current_dir() {
        let cwd = tempfile::tempdir().unwrap();
        fsutil::write(cwd.path().join("local.hpp"), "int local = 1;\n").unwrap();

        let generated = Expander::new()
            .expand(cwd.path(), "#include \"local.hpp\"\nint main() {}\n")
            .unwrap();

        assert_eq!(generated, "\nint local = 1;\nint main() {}\n");
    }

    #[test]
    fn unreadable_header_keeps_its_include() {
        let lib = tempfile::tempdir().unwrap();
        std::fs::write(lib.path().join("broken.hpp"), [0xff, 0xfe, 0x00, 0x80]).unwrap();

        let cwd = tempfile::tempdir().unwrap();
        let generated = Expander::new()
            .library_dirs(&[lib.path().to_owned()])
            .expand(cwd.path(), "#include <broken.hpp>\nint main() {}\n")
            .unwrap();

        assert_eq!(generated, "#include <broken.hpp>\n\nint main() {}\n");
    }
}
