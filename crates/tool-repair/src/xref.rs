//! Cross-reference reconstruction from `N G obj` markers.

use std::collections::BTreeMap;
use std::io::Write;

use once_cell::sync::Lazy;
use regex::bytes::Regex;

static OBJ_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,10})[ \t\r\n]+(\d{1,5})[ \t\r\n]+obj\b").expect("valid regex"));
static CATALOG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/Type\s*/Catalog\b").expect("valid regex"));
static PAGES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/Type\s*/Pages\b").expect("valid regex"));
static PARENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/Parent\b").expect("valid regex"));

#[derive(Debug, Clone, Copy)]
struct Located {
    generation: u16,
    offset: usize,
}

/// Append a fresh cross-reference section describing every object found.
///
/// On failure, returns the reasons the file could not be reconstructed.
pub fn rebuild(data: &[u8]) -> std::result::Result<Vec<u8>, Vec<String>> {
    let objects = scan_objects(data);
    if objects.is_empty() {
        return Err(vec!["No PDF objects found in the file".to_string()]);
    }
    log::debug!("Found {} object marker(s)", objects.len());

    let mut out = data.to_vec();
    if !out.ends_with(b"\n") {
        out.push(b'\n');
    }

    let mut objects = objects;
    let root = match find_object(data, &objects, |body| CATALOG_RE.is_match(body)) {
        Some(id) => id,
        None => {
            // Synthesise a catalog over the root of the page tree
            let pages = find_object(data, &objects, |body| {
                PAGES_RE.is_match(body) && !PARENT_RE.is_match(body)
            })
            .ok_or_else(|| {
                vec![
                    "No document catalog found".to_string(),
                    "No page tree found".to_string(),
                ]
            })?;
            let id = first_free_number(&objects);
            let offset = out.len();
            write!(
                out,
                "{} 0 obj\n<< /Type /Catalog /Pages {} {} R >>\nendobj\n",
                id, pages.0, pages.1
            )
            .map_err(|e| vec![e.to_string()])?;
            objects.insert(id, Located { generation: 0, offset });
            (id, 0)
        }
    };

    let size = objects.keys().next_back().map_or(1, |&max| u64::from(max) + 1);
    let xref_offset = out.len();
    let mut table = xref_table(&objects);
    table.push_str(&format!(
        "trailer\n<< /Size {} /Root {} {} R >>\nstartxref\n{}\n%%EOF\n",
        size, root.0, root.1, xref_offset
    ));
    out.extend_from_slice(table.as_bytes());
    Ok(out)
}

/// Cross-reference section listing only the objects found, one subsection
/// per run of consecutive object numbers.
fn xref_table(objects: &BTreeMap<u32, Located>) -> String {
    let mut table = String::from("xref\n0 1\n0000000000 65535 f \n");
    let mut run: Vec<(u32, Located)> = Vec::new();
    for (&num, &loc) in objects {
        if let Some(&(last, _)) = run.last() {
            if u64::from(last) + 1 != u64::from(num) {
                push_subsection(&mut table, &run);
                run.clear();
            }
        }
        run.push((num, loc));
    }
    push_subsection(&mut table, &run);
    table
}

fn push_subsection(table: &mut String, run: &[(u32, Located)]) {
    let Some(&(start, _)) = run.first() else {
        return;
    };
    table.push_str(&format!("{} {}\n", start, run.len()));
    for (_, loc) in run {
        table.push_str(&format!("{:010} {:05} n \n", loc.offset, loc.generation));
    }
}

/// Lowest object number not already in use.
fn first_free_number(objects: &BTreeMap<u32, Located>) -> u32 {
    let mut id = 1;
    for &num in objects.keys() {
        if num != id {
            break;
        }
        id += 1;
    }
    id
}

/// Object number -> last location of its `N G obj` marker.
fn scan_objects(data: &[u8]) -> BTreeMap<u32, Located> {
    let mut objects = BTreeMap::new();
    for caps in OBJ_RE.captures_iter(data) {
        let whole = match caps.get(0) {
            Some(m) => m,
            None => continue,
        };
        // The number must start a token
        if whole.start() > 0 && !data[whole.start() - 1].is_ascii_whitespace() {
            continue;
        }
        let number = parse_num::<u32>(caps.get(1).map(|m| m.as_bytes()));
        let generation = parse_num::<u16>(caps.get(2).map(|m| m.as_bytes()));
        if let (Some(number), Some(generation)) = (number, generation) {
            if number > 0 {
                objects.insert(
                    number,
                    Located {
                        generation,
                        offset: whole.start(),
                    },
                );
            }
        }
    }
    objects
}

fn parse_num<T: std::str::FromStr>(bytes: Option<&[u8]>) -> Option<T> {
    std::str::from_utf8(bytes?).ok()?.parse().ok()
}

/// Last object whose body satisfies `pred`.
fn find_object(
    data: &[u8],
    objects: &BTreeMap<u32, Located>,
    pred: impl Fn(&[u8]) -> bool,
) -> Option<(u32, u16)> {
    objects
        .iter()
        .filter(|(_, loc)| pred(object_body(data, loc.offset)))
        .max_by_key(|(_, loc)| loc.offset)
        .map(|(&num, loc)| (num, loc.generation))
}

fn object_body(data: &[u8], offset: usize) -> &[u8] {
    let rest = &data[offset..];
    let end = rest
        .windows(6)
        .position(|w| w == b"endobj")
        .unwrap_or(rest.len().min(4096));
    &rest[..end]
}
