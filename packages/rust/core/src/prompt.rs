//! The prompt sent to the generation service.

/// Combine the page (already stripped of the request form) and the user's
/// instructions into one prompt.
///
/// Both inputs are inserted verbatim. Instructions come straight from an
/// issue body, so whatever they say reaches the model unfiltered.
pub fn build_prompt(document_html: &str, instructions: &str) -> String {
    format!(
        "
Please modify the following HTML/CSS/JS webpage according to these instructions:

INSTRUCTIONS: {instructions}

IMPORTANT RULES:
1. Return the COMPLETE updated HTML file, not just a snippet or the changes.
2. Respond with only the HTML code, no explanations or markdown formatting.
3. Feel free to enhance the CSS and add JavaScript as needed.
4. Maintain the overall structure with html, head, and body tags.

CURRENT HTML:
```html
{document_html}
```

Provide the complete updated HTML file:
"
    )
}
