use std::fmt::Write;

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[derive(Debug, Clone, Copy)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

impl Anchor {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Middle => "middle",
            Self::End => "end",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TextStyle<'a> {
    pub size: f64,
    pub color: &'a str,
    pub anchor: Anchor,
    pub bold: bool,
}

impl Default for TextStyle<'_> {
    fn default() -> Self {
        Self {
            size: 14.0,
            color: "black",
            anchor: Anchor::Start,
            bold: false,
        }
    }
}

/// 逐步累加元素的 SVG 文件
#[derive(Debug)]
pub struct SvgDocument {
    width: f64,
    height: f64,
    body: String,
}

impl SvgDocument {
    pub fn new(width: f64, height: f64) -> Self {
        let mut doc = Self {
            width,
            height,
            body: String::new(),
        };
        doc.rect(0.0, 0.0, width, height, "white", 1.0, None);
        doc
    }

    #[allow(clippy::too_many_arguments)]
    pub fn rect(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: &str,
        opacity: f64,
        stroke: Option<&str>,
    ) {
        let _ = write!(
            self.body,
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}" fill-opacity="{:.2}""#,
            x,
            y,
            width.max(0.0),
            height.max(0.0),
            fill,
            opacity
        );
        if let Some(stroke) = stroke {
            let _ = write!(self.body, r#" stroke="{}" stroke-width="1""#, stroke);
        }
        self.body.push_str("/>\n");
    }

    #[allow(clippy::too_many_arguments)]
    pub fn line(
        &mut self,
        from: (f64, f64),
        to: (f64, f64),
        stroke: &str,
        width: f64,
        opacity: f64,
        dashed: bool,
    ) {
        let _ = write!(
            self.body,
            r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-width="{:.2}" stroke-opacity="{:.2}""#,
            from.0, from.1, to.0, to.1, stroke, width, opacity
        );
        if dashed {
            self.body.push_str(r#" stroke-dasharray="6 4""#);
        }
        self.body.push_str("/>\n");
    }

    pub fn polyline(&mut self, points: &[(f64, f64)], stroke: &str, width: f64, opacity: f64) {
        if points.is_empty() {
            return;
        }
        self.body.push_str(r#"<polyline fill="none" points=""#);
        for (i, (x, y)) in points.iter().enumerate() {
            if i > 0 {
                self.body.push(' ');
            }
            let _ = write!(self.body, "{:.2},{:.2}", x, y);
        }
        let _ = writeln!(
            self.body,
            r#"" stroke="{}" stroke-width="{:.2}" stroke-opacity="{:.2}"/>"#,
            stroke, width, opacity
        );
    }

    pub fn text(&mut self, x: f64, y: f64, content: &str, style: TextStyle<'_>) {
        let _ = writeln!(
            self.body,
            r#"<text x="{:.2}" y="{:.2}" font-family="sans-serif" font-size="{:.1}" fill="{}" text-anchor="{}"{}>{}</text>"#,
            x,
            y,
            style.size,
            style.color,
            style.anchor.as_str(),
            if style.bold { r#" font-weight="bold""# } else { "" },
            escape(content)
        );
    }

    pub fn finish(self) -> String {
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n{body}</svg>\n",
            w = self.width,
            h = self.height,
            body = self.body
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("S1 <Lub> & \"Dub\""), "S1 &lt;Lub&gt; &amp; &quot;Dub&quot;");
    }

    #[test]
    fn test_document_structure() {
        let mut doc = SvgDocument::new(100.0, 50.0);
        doc.polyline(&[(0.0, 1.0), (2.0, 3.0)], "black", 1.0, 1.0);
        doc.text(1.0, 2.0, "a<b", TextStyle::default());
        let svg = doc.finish();

        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains(r#"points="0.00,1.00 2.00,3.00""#));
        assert!(svg.contains("a&lt;b"));
    }
}
