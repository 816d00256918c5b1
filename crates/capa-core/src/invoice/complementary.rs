//! The "informações complementares" notes block.

const START_MARKER: &str = "INFORMAÇÕES COMPLEMENTARES";
const END_MARKER: &str = "RESERVADO AO FISCO";

/// Notes following the complementary-info marker, one per line.
///
/// Lines starting with `-` are dropped. Returns `None` when nothing is
/// collected; the record then omits the field instead of sentineling it.
pub fn extract_complementary_info<'a, I>(lines: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let collected: Vec<&str> = lines
        .into_iter()
        .skip_while(|line| !line.contains(START_MARKER))
        .skip(1)
        .take_while(|line| !line.contains(END_MARKER))
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('-'))
        .collect();

    if collected.is_empty() {
        None
    } else {
        Some(collected.join("\n"))
    }
}
