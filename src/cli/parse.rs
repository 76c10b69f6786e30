use daymerge_core::assemble::HeadingStyle;
use daymerge_core::images::SearchPolicy;

/// Parse heading style from string
pub fn parse_heading_style(s: &str) -> std::result::Result<HeadingStyle, String> {
    s.parse::<HeadingStyle>().map_err(|e| e.to_string())
}

/// Parse image search policy from string
pub fn parse_search_policy(s: &str) -> std::result::Result<SearchPolicy, String> {
    s.parse::<SearchPolicy>().map_err(|e| e.to_string())
}
