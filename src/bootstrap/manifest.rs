use crate::domain::model::{PackageSpec, VersionOp};
use crate::utils::error::{JournalError, Result};
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;

/// 依賴清單：每行一個套件描述，`#` 之後為註解
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub packages: Vec<PackageSpec>,
}

// 兩字元的運算子必須排在單字元之前
const OPERATORS: [(&str, VersionOp); 7] = [
    ("==", VersionOp::Eq),
    ("!=", VersionOp::Ne),
    (">=", VersionOp::Ge),
    ("<=", VersionOp::Le),
    ("~=", VersionOp::Compatible),
    (">", VersionOp::Gt),
    ("<", VersionOp::Lt),
];

impl Manifest {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| JournalError::ManifestError {
            line: 0,
            message: format!("cannot read '{}': {}", path.display(), e),
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let name_re = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").map_err(|e| JournalError::ConfigError {
            message: e.to_string(),
        })?;
        let version_re = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9.*+_-]*$").map_err(|e| JournalError::ConfigError {
            message: e.to_string(),
        })?;

        let mut packages = Vec::new();
        let mut seen = HashSet::new();

        for (index, raw) in content.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }

            let spec = parse_specifier(line, line_no, &name_re, &version_re)?;

            if !seen.insert(spec.name.to_ascii_lowercase()) {
                return Err(JournalError::ManifestError {
                    line: line_no,
                    message: format!("package '{}' is listed more than once", spec.name),
                });
            }

            packages.push(spec);
        }

        tracing::debug!("📦 Manifest lists {} packages", packages.len());
        Ok(Self { packages })
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

fn parse_specifier(line: &str, line_no: usize, name_re: &Regex, version_re: &Regex) -> Result<PackageSpec> {
    let corrupt = |message: String| JournalError::ManifestError {
        line: line_no,
        message,
    };

    let split = line.find(|c: char| matches!(c, '=' | '!' | '<' | '>' | '~'));

    let (name, constraint) = match split {
        None => (line, None),
        Some(pos) => {
            let (name, rest) = line.split_at(pos);
            let (op, version) = OPERATORS
                .iter()
                .find_map(|(token, op)| rest.strip_prefix(token).map(|v| (*op, v.trim())))
                .ok_or_else(|| corrupt(format!("unknown version operator in '{}'", line)))?;

            if !version_re.is_match(version) {
                return Err(corrupt(format!("invalid version '{}'", version)));
            }
            (name.trim(), Some((op, version.to_string())))
        }
    };

    if !name_re.is_match(name) {
        return Err(corrupt(format!("invalid package name '{}'", name)));
    }

    Ok(PackageSpec {
        name: name.to_string(),
        constraint,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manifest_with_comments() {
        let manifest = Manifest::parse(
            "# runtime deps\n\
             axum==0.7.5\n\
             \n\
             serde >= 1.0   # trailing comment\n\
             tokio\n",
        )
        .unwrap();

        assert_eq!(manifest.len(), 3);
        assert_eq!(
            manifest.packages[0].constraint,
            Some((VersionOp::Eq, "0.7.5".to_string()))
        );
        assert_eq!(manifest.packages[1].name, "serde");
        assert_eq!(
            manifest.packages[1].constraint,
            Some((VersionOp::Ge, "1.0".to_string()))
        );
        assert_eq!(manifest.packages[2].constraint, None);
    }

    #[test]
    fn test_corrupt_lines_report_line_number() {
        let err = Manifest::parse("axum==0.7\n???\n").unwrap_err();
        match err {
            JournalError::ManifestError { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(Manifest::parse("axum=0.7").is_err());
        assert!(Manifest::parse("axum==").is_err());
        assert!(Manifest::parse("axum==0.7 extra").is_err());
    }

    #[test]
    fn test_duplicate_package_is_rejected() {
        assert!(Manifest::parse("serde\nSerde==1.0\n").is_err());
    }

    #[test]
    fn test_missing_manifest_file() {
        let err = Manifest::from_file("/no/such/requirements.txt").unwrap_err();
        assert!(matches!(err, JournalError::ManifestError { line: 0, .. }));
    }

    #[test]
    fn test_empty_manifest_is_valid() {
        assert!(Manifest::parse("# nothing\n\n").unwrap().is_empty());
    }
}
