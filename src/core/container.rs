//! Container group status as reported by `<compose> ps`

use regex::Regex;
use std::sync::LazyLock;

static UP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(up|running)\b").expect("valid up pattern"));

// Columns are padded with at least two spaces; cells may contain single ones
static CELL_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid separator pattern"));

/// Observed state of one service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerStatus {
    /// Service line reports the container Up / running
    Up(String),
    /// Service is listed but not Up (exited, restarting, created...)
    Down(String),
    /// Service does not appear in the listing
    Missing,
}

/// Column positions taken from the `ps` header
#[derive(Debug, Default)]
struct Layout {
    service: Option<usize>,
    status: Option<usize>,
}

impl Layout {
    fn from_header(cells: &[&str]) -> Self {
        let find = |names: &[&str]| {
            cells
                .iter()
                .position(|c| names.iter().any(|n| c.eq_ignore_ascii_case(n)))
        };
        Layout {
            service: find(&["SERVICE"]),
            status: find(&["STATUS", "STATE"]),
        }
    }
}

impl ContainerStatus {
    /// Find the service in `ps` output and classify it
    ///
    /// With a SERVICE column the service must equal that cell; otherwise the
    /// container name (first column) must contain the service as a whole
    /// word, so `app` matches `myproject-app-1` but not `application`. Up is
    /// read from the STATUS/STATE cell when the header names one. Other
    /// columns (image, command) are never consulted. When several
    /// containers of the service are listed, any Up one wins.
    pub fn parse(ps_output: &str, service: &str) -> Self {
        let name_re = Regex::new(&format!(r"(^|[_\-.]){}([_\-.]|$)", regex::escape(service)))
            .expect("escaped service name is a valid pattern");

        let mut layout = Layout::default();
        let mut found: Option<ContainerStatus> = None;

        for line in ps_output.lines() {
            let trimmed = line.trim();
            // Blank lines and the legacy `-----` rule under the header
            if trimmed.is_empty() || trimmed.starts_with('-') {
                continue;
            }

            let cells: Vec<&str> = CELL_SEPARATOR.split(trimmed).collect();
            if cells[0].eq_ignore_ascii_case("NAME") {
                layout = Layout::from_header(&cells);
                continue;
            }

            let matches_service = match layout.service.and_then(|i| cells.get(i)) {
                Some(cell) => *cell == service,
                None => name_re.is_match(cells[0]),
            };
            if !matches_service {
                continue;
            }

            let status = layout
                .status
                .and_then(|i| cells.get(i).copied())
                .unwrap_or(trimmed);
            if UP.is_match(status) {
                return ContainerStatus::Up(trimmed.to_string());
            }
            found.get_or_insert(ContainerStatus::Down(trimmed.to_string()));
        }

        found.unwrap_or(ContainerStatus::Missing)
    }

    pub fn is_up(&self) -> bool {
        matches!(self, ContainerStatus::Up(_))
    }

    /// Human description for error messages
    pub fn describe(&self) -> String {
        match self {
            ContainerStatus::Up(line) => format!("up: {}", line),
            ContainerStatus::Down(line) => format!("not up: {}", line),
            ContainerStatus::Missing => "not listed".to_string(),
        }
    }
}
