use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::describe_score;
use crate::compare::DiffRecord;
use crate::walk;

struct Row {
    name: String,
    score: String,
    left: String,
    right: String,
}

/// Path from `base` to `path`; both must be absolute and clean.
pub fn relative_to(path: &Path, base: &Path) -> PathBuf {
    let p: Vec<_> = path.components().collect();
    let b: Vec<_> = base.components().collect();
    let common = p.iter().zip(&b).take_while(|(x, y)| x == y).count();

    let mut out = PathBuf::new();
    for _ in common..b.len() {
        out.push("..");
    }
    for c in &p[common..] {
        out.push(c);
    }
    out
}

/// URL for `path` as seen from a page living in `base`.
fn href(path: &Path, base: &Path) -> Result<String> {
    let abs = std::path::absolute(path)
        .with_context(|| format!("Failed to resolve {}", path.display()))?;
    let rel = relative_to(&walk::clean(&abs), base);
    let joined = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    Ok(url_encode(&joined))
}

fn build_html(rows: &[Row], left_root: &Path, right_root: &Path) -> String {
    let mut body_rows = String::new();

    for row in rows {
        body_rows.push_str(&format!(
            r#"        <tr>
          <td class="name">{name}<div class="score">{score}</div></td>
          <td><div class="stack amplified"><img src="{left}" loading="lazy" /><img class="blend" src="{right}" loading="lazy" /></div></td>
          <td><div class="stack"><img src="{left}" loading="lazy" /><img class="blend" src="{right}" loading="lazy" /></div></td>
          <td><a href="{left}"><img src="{left}" alt="left {name}" loading="lazy" /></a></td>
          <td><a href="{right}"><img src="{right}" alt="right {name}" loading="lazy" /></a></td>
        </tr>
"#,
            name = row.name,
            score = row.score,
            left = row.left,
            right = row.right,
        ));
    }

    let summary = format!(
        "{} diffs &middot; {} &rarr; {}",
        rows.len(),
        html_escape(&left_root.display().to_string()),
        html_escape(&right_root.display().to_string()),
    );

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <title>imgdiff report</title>
  <style>
    :root {{ color-scheme: light; }}
    body {{
      font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif;
      margin: 0; padding: 24px;
      background-color: #e6e6e6;
      background-size: 16px 16px;
      background-image: linear-gradient(45deg, rgba(255,255,255,.2) 25%, transparent 25%, transparent 50%,
        rgba(255,255,255,.2) 50%, rgba(255,255,255,.2) 75%, transparent 75%, transparent);
      color: #1f2933;
    }}
    h1 {{ margin: 0 0 8px; font-size: 22px; }}
    .meta {{ margin-bottom: 16px; color: #52606d; font-size: 14px; }}
    table {{ width: 100%; table-layout: fixed; border-collapse: collapse; }}
    th, td {{ border: 1px solid #d2d6dc; padding: 8px; vertical-align: top; text-align: left; }}
    th {{ background: #f0f4f8; font-weight: 600; font-size: 14px; }}
    td.name {{ font-size: 13px; word-break: break-word; width: 16%; }}
    .score {{ margin-top: 4px; color: #c81e1e; font-family: monospace; }}
    .stack {{ position: relative; }}
    .stack img.blend {{ position: absolute; left: 0; top: 0; mix-blend-mode: difference; }}
    .stack.amplified {{ filter: grayscale(1) brightness(256); }}
    td img {{ max-width: 100%; max-height: 320px; display: block; }}
  </style>
</head>
<body>
  <h1>imgdiff report</h1>
  <div class="meta">{summary}</div>
  <table>
    <thead>
      <tr>
        <th>Name</th>
        <th>Amplified difference</th>
        <th>Difference</th>
        <th>Left</th>
        <th>Right</th>
      </tr>
    </thead>
    <tbody>
{body_rows}    </tbody>
  </table>
</body>
</html>"##
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn url_encode(s: &str) -> String {
    s.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                String::from(b as char)
            }
            _ => format!("%{:02X}", b),
        })
        .collect()
}

/// Write the ranked records to `path`. Image links are relative to the
/// report's own directory.
pub fn write(path: &Path, records: &[DiffRecord], left_root: &Path, right_root: &Path) -> Result<()> {
    let abs = std::path::absolute(path)
        .with_context(|| format!("Failed to resolve {}", path.display()))?;
    let abs = walk::clean(&abs);
    let base = abs.parent().map(Path::to_path_buf).unwrap_or_default();

    let rows = records
        .iter()
        .map(|r| -> Result<Row> {
            let name = r.left.strip_prefix(left_root).unwrap_or(r.left.as_path());
            Ok(Row {
                name: html_escape(&name.display().to_string()),
                score: html_escape(&describe_score(r)),
                left: href(&r.left, &base)?,
                right: href(&r.right, &base)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    std::fs::create_dir_all(&base)
        .with_context(|| format!("Failed to create {}", base.display()))?;
    std::fs::write(&abs, build_html(&rows, left_root, right_root))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
