//! Rendering of the `.travis.yml` placed at the root of every build branch.
//!
//! The CI script installs PlatformIO, installs the published library version
//! and then builds every staged example for every resolved board.

/// File name of the generated CI configuration.
pub const TRAVIS_FILENAME: &str = ".travis.yml";

const TEMPLATE: &str = r#"language: python
python:
    - "2.7"

sudo: false

# Cache PlatformIO packages using Travis CI container-based infrastructure
cache:
    directories:
        - "~/.platformio"

env:
{envs}

install:
    - pip install -U platformio

script:
    - platformio --force lib install --version={library_version} {library_id}
    - platformio --force ci {boards}
"#;

/// Inputs of the CI template.
#[derive(Debug, Clone)]
pub struct TravisConfig<'a> {
    pub library_id: u64,
    pub version_name: &'a str,
    pub boards: &'a [String],
    pub example_paths: &'a [String],
}

impl TravisConfig<'_> {
    /// One `PLATFORMIO_CI_SRC` line per example.
    pub fn env_lines(&self) -> String {
        self.example_paths
            .iter()
            .map(|path| format!("    - PLATFORMIO_CI_SRC={}", path))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// One `--board=` flag per board.
    pub fn board_flags(&self) -> String {
        self.boards
            .iter()
            .map(|board| format!("--board={}", board))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The complete `.travis.yml` text.
    pub fn render(&self) -> String {
        let envs = self.env_lines();
        let library_id = self.library_id.to_string();
        let boards = self.board_flags();

        // single pass, so values are never themselves interpolated
        let mut out = String::with_capacity(TEMPLATE.len() + envs.len() + boards.len());
        let mut rest = TEMPLATE;
        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let tail = &rest[start..];
            let Some(end) = tail.find('}') else {
                out.push_str(tail);
                return out;
            };
            match &tail[1..end] {
                "envs" => out.push_str(&envs),
                "library_version" => out.push_str(self.version_name),
                "library_id" => out.push_str(&library_id),
                "boards" => out.push_str(&boards),
                _ => out.push_str(&tail[..=end]),
            }
            rest = &tail[end + 1..];
        }
        out.push_str(rest);
        out
    }
}
