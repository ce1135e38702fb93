//! Plain-text script reference

/// One entry of the command reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelpEntry {
    /// Upper-case keyword
    pub keyword: &'static str,
    /// Call shape
    pub usage: &'static str,
    /// What the command does
    pub summary: &'static str,
    /// Example lines
    pub examples: &'static [&'static str],
}

/// Every command of the script language, in reference order
pub const COMMANDS: &[HelpEntry] = &[
    HelpEntry {
        keyword: "GO",
        usage: "GO(x, y)",
        summary: "Move to a point in work coordinates (mm). With one argument Y stays where it is.",
        examples: &["GO(150, 200)", "GO(50)"],
    },
    HelpEntry {
        keyword: "SPEED",
        usage: "SPEED(v)",
        summary: "Set the travel speed (mm/s).",
        examples: &["SPEED(100)"],
    },
    HelpEntry {
        keyword: "PAUSE",
        usage: "PAUSE(t)",
        summary: "Wait t seconds.",
        examples: &["PAUSE(2.5)"],
    },
    HelpEntry {
        keyword: "CYCLE",
        usage: "CYCLE(x1, y1, x2, y2, N, [T])",
        summary: "Shuttle between two points N times, pausing T seconds at each (default 0.5). \
                  The short form takes X only and keeps Y at 0.",
        examples: &[
            "CYCLE(100, 100, 200, 100, 5)",
            "CYCLE(100, 100, 200, 100, 5, 2)",
            "CYCLE(100, 200, 10)",
            "CYCLE(100, 200, 10, 1.5)",
        ],
    },
    HelpEntry {
        keyword: "FIRE",
        usage: "FIRE(v)",
        summary: "Torch on when v is positive, off otherwise. ARC(v) is an alias.",
        examples: &["FIRE(1)", "FIRE(0)"],
    },
    HelpEntry {
        keyword: "START",
        usage: "START",
        summary: "Marks the start of a program. Ignored.",
        examples: &["START"],
    },
    HelpEntry {
        keyword: "END",
        usage: "END",
        summary: "Stop the script, dropping anything after it.",
        examples: &["END"],
    },
];

/// Look up a command by keyword, any case
pub fn help_for(keyword: &str) -> Option<&'static HelpEntry> {
    let keyword = keyword.trim();
    let keyword = if keyword.eq_ignore_ascii_case("ARC") {
        "FIRE"
    } else {
        keyword
    };
    COMMANDS
        .iter()
        .find(|entry| entry.keyword.eq_ignore_ascii_case(keyword))
}

/// The full reference as plain text
pub fn help_text() -> String {
    let mut text = String::from("Script commands\n\n");
    for entry in COMMANDS {
        text.push_str(entry.usage);
        text.push('\n');
        text.push_str("  ");
        text.push_str(entry.summary);
        text.push('\n');
        for example in entry.examples {
            text.push_str("  e.g. ");
            text.push_str(example);
            text.push('\n');
        }
        text.push('\n');
    }
    text.push_str("Lines starting with // or # are ignored.\n");
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_command;

    #[test]
    fn test_help_for() {
        assert_eq!(help_for("cycle").map(|e| e.keyword), Some("CYCLE"));
        assert_eq!(help_for(" arc ").map(|e| e.keyword), Some("FIRE"));
        assert!(help_for("JUMP").is_none());
    }

    #[test]
    fn test_examples_parse() {
        for entry in COMMANDS {
            for example in entry.examples {
                assert!(parse_command(example).is_ok(), "{}", example);
            }
        }
    }

    #[test]
    fn test_help_text_lists_every_command() {
        let text = help_text();
        for entry in COMMANDS {
            assert!(text.contains(entry.usage));
        }
    }
}
