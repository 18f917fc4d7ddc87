/// Clean user-submitted text using the ammonia library.
///
/// Whitelist-based: safe inline tags survive, `<script>` and event handler
/// attributes are stripped. Applied to review and comment text and title
/// descriptions before they are stored.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
