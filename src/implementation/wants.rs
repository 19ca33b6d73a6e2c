// Copyright 2020 Xavier Gillard
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! The wants-file parser. This is the stage turning the human-authored text
//! format (official names section, `#pragma user` lines, offer lines with
//! ranked wishlists) into a `RawInstance`. Everything suspicious about the
//! input becomes a diagnostic; only a missing file aborts the stage.

use std::fs;
use std::path::Path;

use regex::Regex;

use crate::{Diagnostic, Error, RawInstance, RawItem, RawUser};

/// Marks the start of the official names section.
const BEGIN_OFFICIAL: &str = "!BEGIN-OFFICIAL-NAMES";
/// Marks the end of the official names section.
const END_OFFICIAL: &str = "!END-OFFICIAL-NAMES";

/// The compiled line patterns of the wants format.
struct LinePatterns {
    /// `#pragma user "<name>"` -- the quotes are optional
    pragma_user: Regex,
    /// `(<owner>) <item-id>[ : <wishlist>]`
    offer: Regex,
    /// `<item-id> ==> "<name>" (from <owner>)`
    official_name: Regex,
}

impl LinePatterns {
    fn new() -> Self {
        LinePatterns {
            pragma_user: Regex::new(r#"^#pragma user\s+"?([\w-]+)"?$"#).unwrap(),
            offer: Regex::new(r"^\(([\w-]+)\)\s+(\S+)(?:\s*:\s*(.*))?$").unwrap(),
            official_name: Regex::new(r#"^([\w-]+)\s+==>\s+"([^"]+)"\s+\(from\s+([\w-]+)\)$"#)
                .unwrap(),
        }
    }
}

/// Parses a wants file from disk. The file is decoded as UTF-8 with the
/// replacement character standing in for undecodable bytes. A missing file
/// is the one fatal condition of this stage.
pub fn parse_wants_file<P: AsRef<Path>>(path: P) -> Result<(RawInstance, Vec<Diagnostic>), Error> {
    let bytes = fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(parse_wants(&text))
}

/// Parses the wants text format into a raw instance plus the list of
/// diagnostics raised along the way. This function never fails: malformed
/// lines are skipped with a warning.
pub fn parse_wants(text: &str) -> (RawInstance, Vec<Diagnostic>) {
    let patterns = LinePatterns::new();
    let mut out = RawInstance::default();
    let mut diags = Vec::new();

    let mut in_official = false;
    let mut current_user: Option<String> = None;

    for (number, raw_line) in text.lines().enumerate() {
        let number = number + 1;
        let line = raw_line.trim();

        if line.starts_with(BEGIN_OFFICIAL) {
            in_official = true;
            continue;
        }
        if line.starts_with(END_OFFICIAL) {
            in_official = false;
            continue;
        }

        if in_official {
            official_name_line(&patterns, line, number, &mut out, &mut diags);
            continue;
        }

        if let Some(cap) = patterns.pragma_user.captures(line) {
            current_user = Some(cap[1].to_string());
            continue;
        }

        // anything else starting with '#', and blank lines, are comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let (Some(cap), Some(user)) = (patterns.offer.captures(line), current_user.as_ref()) {
            offer_line(&cap, user, number, &mut out, &mut diags);
            continue;
        }

        Diagnostic::emit(&mut diags, format!("unrecognised line {}: {}", number, line));
    }

    (out, diags)
}

/// Handles one line of the official names section: registers the item under
/// a unique id (copy-suffixing colliding ids) with its sanitised name.
fn official_name_line(
    patterns: &LinePatterns,
    line: &str,
    number: usize,
    out: &mut RawInstance,
    diags: &mut Vec<Diagnostic>,
) {
    if line.is_empty() {
        return;
    }
    let cap = match patterns.official_name.captures(line) {
        Some(cap) => cap,
        None => {
            Diagnostic::emit(
                diags,
                format!("unrecognised official-names line {}: {}", number, line),
            );
            return;
        }
    };
    let item_id = &cap[1];
    let name = sanitise_name(&cap[2], number, diags);
    let owner = &cap[3];

    register_item(out, item_id, name, owner, number, true, diags);
}

/// Handles one offer line: checks the declared owner against the current
/// pragma user, cleans and validates the wishlist and records the offer.
fn offer_line(
    cap: &regex::Captures,
    current_user: &str,
    number: usize,
    out: &mut RawInstance,
    diags: &mut Vec<Diagnostic>,
) {
    let owner = &cap[1];
    let item_id = &cap[2];
    let wants = cap.get(3).map(|m| m.as_str()).unwrap_or("");

    if owner != current_user {
        Diagnostic::emit(
            diags,
            format!(
                "offer owner ({}) differs from the current user ({}) at line {}; line skipped",
                owner, current_user, number
            ),
        );
        return;
    }

    // split the wishlist, dropping the trailing '%' comment, then validate
    // every reference against the items registered so far
    let mut wishlist = Vec::new();
    let wants = wants.split('%').next().unwrap_or("");
    for id in wants.split(|c: char| c.is_whitespace() || c == ',') {
        if id.is_empty() {
            continue;
        }
        if out.items.contains_key(id) {
            wishlist.push(id.to_string());
        } else {
            Diagnostic::emit(
                diags,
                format!(
                    "wishlist item '{}' of user '{}' does not exist (line {})",
                    id, current_user, number
                ),
            );
        }
    }

    // an item offered without an official name gets registered on the fly,
    // named after its own id
    let item_id = register_item(
        out,
        item_id,
        item_id.to_string(),
        current_user,
        number,
        false,
        diags,
    );

    out.users
        .entry(current_user.to_string())
        .or_insert_with(RawUser::default)
        .offers
        .insert(item_id, wishlist);
}

/// Registers an item in the item table and returns the id it ended up under.
/// A re-insertion by the same owner is idempotent (the id is simply reused,
/// and the duplicate is only worth a warning when it is a second official
/// declaration); a colliding insertion by a *different* owner receives a
/// `-COPY<k>` suffix with the smallest k making it unique.
fn register_item(
    out: &mut RawInstance,
    item_id: &str,
    name: String,
    owner: &str,
    number: usize,
    declaration: bool,
    diags: &mut Vec<Diagnostic>,
) -> String {
    match out.items.get(item_id) {
        None => {
            out.items.insert(
                item_id.to_string(),
                RawItem {
                    owner: owner.to_string(),
                    name,
                },
            );
            item_id.to_string()
        }
        Some(existing) if existing.owner == owner => {
            if declaration {
                Diagnostic::emit(
                    diags,
                    format!(
                        "item '{}' declared twice by '{}' at line {}",
                        item_id, owner, number
                    ),
                );
            }
            item_id.to_string()
        }
        Some(_) => {
            let mut copy = 1;
            let mut new_id = format!("{}-COPY{}", item_id, copy);
            while out.items.contains_key(&new_id) {
                copy += 1;
                new_id = format!("{}-COPY{}", item_id, copy);
            }
            Diagnostic::emit(
                diags,
                format!(
                    "duplicate item id '{}' at line {}; registered as '{}'",
                    item_id, number, new_id
                ),
            );
            // a suffixed official declaration keeps its parsed name; an item
            // suffixed on the fly is named after the id it ended up under
            let name = if declaration { name } else { new_id.clone() };
            out.items.insert(
                new_id.clone(),
                RawItem {
                    owner: owner.to_string(),
                    name,
                },
            );
            new_id
        }
    }
}

/// Strips the U+FFFD replacement characters a lossy decode may have left in
/// an official item name.
fn sanitise_name(name: &str, number: usize, diags: &mut Vec<Diagnostic>) -> String {
    if name.contains('\u{FFFD}') {
        Diagnostic::emit(
            diags,
            format!("unknown characters found in a name at line {}: {}", number, name),
        );
        name.replace('\u{FFFD}', "")
    } else {
        name.to_string()
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_wants {
    use super::*;

    #[test]
    fn parses_a_minimal_trade() {
        let text = "\
#pragma user \"Alice\"
(Alice) item1 : item2
#pragma user \"Bob\"
(Bob) item2 : item1
";
        let (raw, diags) = parse_wants(text);
        // item2 does not exist yet when Alice's wishlist is validated
        assert_eq!(1, diags.len());
        assert_eq!(2, raw.items.len());
        assert_eq!(vec!["item1".to_string()], raw.users["Bob"].offers["item2"]);
        assert!(raw.users["Alice"].offers["item1"].is_empty());
    }

    #[test]
    fn official_names_declare_items_up_front() {
        let text = "\
!BEGIN-OFFICIAL-NAMES
item1 ==> \"Chess Set\" (from Alice)
item2 ==> \"Monopoly\" (from Bob)
!END-OFFICIAL-NAMES
#pragma user \"Alice\"
(Alice) item1 : item2
#pragma user \"Bob\"
(Bob) item2 : item1
";
        let (raw, diags) = parse_wants(text);
        assert!(diags.is_empty());
        assert_eq!("Chess Set", raw.items["item1"].name);
        assert_eq!(vec!["item2".to_string()], raw.users["Alice"].offers["item1"]);
        assert_eq!(vec!["item1".to_string()], raw.users["Bob"].offers["item2"]);
    }

    #[test]
    fn copy_suffixes_colliding_ids_of_different_owners() {
        let text = "\
!BEGIN-OFFICIAL-NAMES
item1 ==> \"Chess Set\" (from Alice)
item1 ==> \"Checkers\" (from Bob)
!END-OFFICIAL-NAMES
";
        let (raw, diags) = parse_wants(text);
        assert_eq!(1, diags.len());
        assert_eq!("Alice", raw.items["item1"].owner);
        assert_eq!("Bob", raw.items["item1-COPY1"].owner);
        assert_eq!("Checkers", raw.items["item1-COPY1"].name);
    }

    #[test]
    fn same_owner_reinsertion_is_idempotent() {
        let text = "\
#pragma user \"Alice\"
(Alice) item1
(Alice) item1
";
        let (raw, diags) = parse_wants(text);
        assert!(diags.is_empty());
        assert_eq!(1, raw.items.len());
        assert_eq!(1, raw.users["Alice"].offers.len());
    }

    #[test]
    fn owner_mismatch_skips_the_line() {
        let text = "\
#pragma user \"Alice\"
(Bob) item1 : item2
";
        let (raw, diags) = parse_wants(text);
        assert_eq!(1, diags.len());
        assert!(raw.users.is_empty());
        assert!(raw.items.is_empty());
    }

    #[test]
    fn wishlists_split_on_commas_and_drop_comments() {
        let text = "\
!BEGIN-OFFICIAL-NAMES
item1 ==> \"A\" (from Alice)
item2 ==> \"B\" (from Bob)
item3 ==> \"C\" (from Bob)
!END-OFFICIAL-NAMES
#pragma user \"Alice\"
(Alice) item1 : item2, item3 % would prefer the second one
";
        let (raw, diags) = parse_wants(text);
        assert!(diags.is_empty());
        assert_eq!(
            vec!["item2".to_string(), "item3".to_string()],
            raw.users["Alice"].offers["item1"]
        );
    }

    #[test]
    fn replacement_characters_are_scrubbed_from_names() {
        let text = "\
!BEGIN-OFFICIAL-NAMES
item1 ==> \"Chess\u{FFFD} Set\" (from Alice)
!END-OFFICIAL-NAMES
";
        let (raw, diags) = parse_wants(text);
        assert_eq!(1, diags.len());
        assert_eq!("Chess Set", raw.items["item1"].name);
    }

    #[test]
    fn unknown_lines_are_warned_and_skipped() {
        let (raw, diags) = parse_wants("this is not a wants line\n");
        assert_eq!(1, diags.len());
        assert!(raw.users.is_empty());
    }

    #[test]
    fn pragma_quotes_are_optional() {
        let text = "\
#pragma user Alice
(Alice) item1
";
        let (raw, diags) = parse_wants(text);
        assert!(diags.is_empty());
        assert_eq!("Alice", raw.items["item1"].owner);
    }
}
