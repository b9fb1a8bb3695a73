//! Résumé templates – render the document model into the HTML subset the
//! painter understands.
//!
//! Rendering is a pure function of the document and the selection: the same
//! inputs always produce byte-identical markup.

use crate::dom::{self, escape_html as esc, DomNode};
use crate::i18n::{section_label, LabelKey, Language};
use crate::model::{CvDocument, Experience};
use crate::selection::{Layout, Selection, TextDirection};

/// Compact layout keeps at most this many achievements per role.
pub const COMPACT_MAX_ACHIEVEMENTS: usize = 4;

/// Output of [`render`]: the markup and its parsed tree.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualDocument {
    pub selection: Selection,
    pub direction: TextDirection,
    pub html: String,
    pub nodes: Vec<DomNode>,
}

impl VisualDocument {
    pub fn is_rtl(&self) -> bool {
        self.direction.is_rtl()
    }

    /// All rendered text, whitespace-collapsed.
    pub fn text_content(&self) -> String {
        let parts: Vec<String> = self.nodes.iter().map(DomNode::text_content).collect();
        dom::collapse_whitespace(&parts.join(" "))
    }

    /// Text of the element tagged `data-field="<field>"`.
    pub fn field_text(&self, field: &str) -> Option<String> {
        dom::find_field(&self.nodes, field).map(|e| e.text_content())
    }
}

/// Colour scheme per layout.
struct Theme {
    header_bg: &'static str,
    accent: &'static str,
    border: &'static str,
    card_bg: &'static str,
    chip_bg: &'static str,
}

impl Theme {
    fn for_layout(layout: Layout) -> Self {
        match layout {
            Layout::Compact => Self {
                header_bg: "#1a1a2e",
                accent: "#1a1a2e",
                border: "#1a1a2e",
                card_bg: "rgba(26, 26, 46, 0.05)",
                chip_bg: "#16213e",
            },
            Layout::Full => Self {
                header_bg: "#16213e",
                accent: "#16213e",
                border: "#1a1a2e",
                card_bg: "rgba(26, 26, 46, 0.05)",
                chip_bg: "#1a1a2e",
            },
        }
    }
}

/// Render the document for the given selection.
pub fn render(doc: &CvDocument, selection: &Selection) -> VisualDocument {
    let direction = selection.direction();
    let ctx = Ctx {
        doc,
        lang: selection.language,
        layout: selection.layout,
        theme: Theme::for_layout(selection.layout),
    };
    let body = match selection.layout {
        Layout::Compact => render_compact(&ctx),
        Layout::Full => render_full(&ctx),
    };
    let html = format!(
        r#"<div class="w-full bg-white" dir="{}" lang="{}">{body}</div>"#,
        direction.as_attr(),
        selection.language.code(),
    );
    let nodes = dom::parse_html(&html);
    log::debug!(
        "Rendered {} layout in '{}' ({} bytes)",
        selection.layout,
        selection.language,
        html.len()
    );
    VisualDocument {
        selection: *selection,
        direction,
        html,
        nodes,
    }
}

struct Ctx<'a> {
    doc: &'a CvDocument,
    lang: Language,
    layout: Layout,
    theme: Theme,
}

impl Ctx<'_> {
    fn label(&self, key: LabelKey) -> String {
        let text = section_label(&self.doc.labels, key, self.lang, self.layout);
        match self.layout {
            Layout::Compact => esc(&text.to_uppercase()),
            Layout::Full => esc(&text),
        }
    }

    fn achievements<'e>(&self, exp: &'e Experience) -> &'e [String] {
        let all = exp.achievements.resolve(self.lang);
        match self.layout {
            Layout::Compact => &all[..all.len().min(COMPACT_MAX_ACHIEVEMENTS)],
            Layout::Full => all,
        }
    }
}

// ---------------------------------------------------------------------------
// Compact: single column, dense
// ---------------------------------------------------------------------------

fn render_compact(c: &Ctx) -> String {
    let doc = c.doc;
    let p = &doc.personal;
    let t = &c.theme;
    let mut out = String::from(r#"<div class="p-6">"#);

    // Header
    out.push_str(&format!(
        r#"<header class="text-center mb-6 pb-4 border-b-2" style="border-color: {border}">
<h1 class="text-3xl font-bold mb-2" style="color: {accent}" data-field="name">{name}</h1>
<h2 class="text-lg text-gray-600 mb-3" data-field="title">{title}</h2>
<div class="flex justify-center flex-wrap gap-4 text-sm">
<span data-field="email">{email}</span>
<span data-field="phone">{phone}</span>
<a class="text-blue-600" href="{href}" data-field="location">{location}</a>
</div>
</header>"#,
        border = t.border,
        accent = t.accent,
        name = esc(&p.name),
        title = esc(p.title.resolve(c.lang)),
        email = esc(&p.email),
        phone = esc(&p.phone),
        href = esc(p.location_url.as_deref().unwrap_or("")),
        location = esc(p.location.resolve(c.lang)),
    ));

    let heading = |key: LabelKey| {
        format!(
            r#"<h3 class="text-lg font-bold mb-2" style="color: {}">{}</h3>"#,
            t.accent,
            c.label(key)
        )
    };

    // Objective
    out.push_str(r#"<section class="mb-5">"#);
    out.push_str(&heading(LabelKey::Objective));
    out.push_str(&format!(
        r#"<p class="text-gray-700 text-sm" data-field="objective">{}</p></section>"#,
        esc(doc.objective.resolve(c.lang))
    ));

    // Experience
    out.push_str(r#"<section class="mb-5">"#);
    out.push_str(&heading(LabelKey::Experience));
    for exp in &doc.experience {
        out.push_str(&format!(
            r#"<div class="mb-3">
<div class="flex justify-between items-start mb-1">
<div class="flex-1"><h4 class="font-bold text-gray-800 text-sm">{title}</h4>
<p class="text-gray-600 text-sm">{company}, {location}</p></div>
<span class="text-gray-600 text-xs shrink-0">{period}</span>
</div>
<ul class="list-disc text-gray-700 ml-3 text-sm">"#,
            title = esc(exp.title.resolve(c.lang)),
            company = esc(&exp.company),
            location = esc(exp.location.resolve(c.lang)),
            period = esc(&exp.period),
        ));
        for achievement in c.achievements(exp) {
            out.push_str(&format!(r#"<li class="mb-1">{}</li>"#, esc(achievement)));
        }
        out.push_str("</ul></div>");
    }
    out.push_str("</section>");

    // Certifications
    if !doc.certifications.is_empty() {
        out.push_str(r#"<section class="mb-5">"#);
        out.push_str(&heading(LabelKey::Certifications));
        for cert in &doc.certifications {
            out.push_str(&format!(
                r#"<div class="mb-2 flex justify-between">
<div class="flex-1"><h4 class="font-semibold text-sm">{name}</h4>
<p class="text-gray-600 text-sm">{issuer}</p></div>
<span class="text-gray-600 text-sm shrink-0">{year}</span>
</div>"#,
                name = esc(&cert.name),
                issuer = esc(&cert.issuer),
                year = esc(&cert.year),
            ));
        }
        out.push_str("</section>");
    }

    // Education
    if !doc.education.is_empty() {
        out.push_str(r#"<section class="mb-5">"#);
        out.push_str(&heading(LabelKey::Education));
        for edu in &doc.education {
            out.push_str(&format!(
                r#"<div class="mb-2 flex justify-between">
<div class="flex-1"><h4 class="font-semibold text-sm">{degree}</h4>
<p class="text-gray-600 text-sm">{institution}</p>"#,
                degree = esc(edu.degree.resolve(c.lang)),
                institution = esc(&edu.institution),
            ));
            if let Some(gpa) = &edu.gpa {
                out.push_str(&format!(
                    r#"<p class="text-gray-500 text-xs">{}: {}</p>"#,
                    c.label(LabelKey::Gpa),
                    esc(gpa)
                ));
            }
            out.push_str(&format!(
                r#"</div><span class="text-gray-600 text-sm shrink-0">{}</span></div>"#,
                esc(&edu.year)
            ));
        }
        out.push_str("</section>");
    }

    // Skills
    out.push_str(r#"<section class="mb-5">"#);
    out.push_str(&heading(LabelKey::Skills));
    out.push_str(&format!(
        r#"<p class="text-sm text-gray-700" data-field="skills">{}</p></section>"#,
        esc(&doc.skills.technical.resolve(c.lang).join(" \u{2022} "))
    ));

    // References are never listed in full here.
    out.push_str("<section>");
    out.push_str(&heading(LabelKey::References));
    out.push_str(&format!(
        r#"<p class="text-gray-600 italic text-sm">{}</p></section>"#,
        esc(&section_label(&doc.labels, LabelKey::ReferencesOnRequest, c.lang, c.layout))
    ));

    out.push_str("</div>");
    out
}

// ---------------------------------------------------------------------------
// Full: header band plus one card per section
// ---------------------------------------------------------------------------

fn render_full(c: &Ctx) -> String {
    let doc = c.doc;
    let t = &c.theme;
    let mut out = full_header(c);
    out.push_str(r#"<div class="p-6 bg-gray-50">"#);

    let card = |key: LabelKey, last: bool, inner: &str| {
        format!(
            r#"<section class="{margin}p-4 rounded-xl" style="background-color: {bg}; border-left: 4px solid {border}">
<h3 class="text-2xl font-bold mb-4 pb-2 flex items-center gap-3" style="color: {accent}"><div class="w-2 h-6 rounded-full shrink-0" style="background-color: {chip}"></div>{title}</h3>
{inner}</section>"#,
            margin = if last { "" } else { "mb-6 " },
            bg = t.card_bg,
            border = t.border,
            accent = t.accent,
            chip = t.chip_bg,
            title = c.label(key),
        )
    };

    // Objective
    out.push_str(&card(
        LabelKey::Objective,
        false,
        &format!(
            r#"<p class="text-gray-700 leading-relaxed" data-field="objective">{}</p>"#,
            esc(doc.objective.resolve(c.lang))
        ),
    ));

    // Experience
    let mut inner = String::new();
    for exp in &doc.experience {
        inner.push_str(&format!(
            r#"<div class="mb-4 p-4 bg-white rounded-lg">
<div class="flex justify-between items-start mb-2">
<div class="flex-1"><h4 class="text-xl font-bold text-gray-800">{title}</h4>
<p class="font-semibold" style="color: {accent}">{company}</p></div>
<div class="shrink-0 flex flex-col items-end gap-1"><span class="text-gray-600 bg-gray-100 px-2 py-1 rounded-full text-sm">{period}</span>
<span class="text-gray-600 text-sm">{location}</span></div>
</div>
<ul class="list-none text-gray-700">"#,
            title = esc(exp.title.resolve(c.lang)),
            accent = t.accent,
            company = esc(&exp.company),
            period = esc(&exp.period),
            location = esc(exp.location.resolve(c.lang)),
        ));
        for achievement in c.achievements(exp) {
            inner.push_str(&format!(
                r#"<li class="flex items-start gap-2 mb-1"><div class="w-1 h-1 rounded-full mt-2 shrink-0" style="background-color: {}"></div><span class="leading-relaxed text-sm">{}</span></li>"#,
                t.chip_bg,
                esc(achievement)
            ));
        }
        inner.push_str("</ul></div>");
    }
    out.push_str(&card(LabelKey::Experience, false, &inner));

    // Projects
    if !doc.projects.is_empty() {
        let mut inner = String::new();
        for project in &doc.projects {
            inner.push_str(&format!(
                r#"<div class="mb-4 p-4 bg-white rounded-lg">
<h4 class="text-lg font-bold text-gray-800 mb-2">{title}</h4>
<p class="text-gray-700 text-sm mb-2">{description}</p>
<div class="flex flex-wrap gap-1 mb-2">"#,
                title = esc(project.title.resolve(c.lang)),
                description = esc(project.description.resolve(c.lang)),
            ));
            for tech in &project.technologies {
                inner.push_str(&format!(
                    r#"<span class="px-2 py-1 text-white rounded text-xs" style="background-color: {}">{}</span>"#,
                    t.chip_bg,
                    esc(tech)
                ));
            }
            inner.push_str(&format!(
                r#"</div><p class="text-gray-600 text-xs">{period} • {impact_label}: {impact}</p></div>"#,
                period = esc(&project.period),
                impact_label = c.label(LabelKey::Impact),
                impact = esc(project.impact.resolve(c.lang)),
            ));
        }
        out.push_str(&card(LabelKey::Projects, false, &inner));
    }

    // Certifications
    if !doc.certifications.is_empty() {
        let mut inner = String::from(r#"<div class="grid grid-cols-2 gap-3">"#);
        for cert in &doc.certifications {
            let badge = if cert.is_active() {
                "bg-green-100 text-green-800"
            } else {
                "bg-yellow-100 text-yellow-800"
            };
            inner.push_str(&format!(
                r#"<div class="p-3 bg-white rounded-lg">
<h4 class="font-bold text-gray-800 text-sm">{name}</h4>
<p class="text-gray-600 text-xs mb-1">{issuer} • {year}</p>
<div class="flex"><span class="text-xs px-2 py-1 rounded-full {badge}">{status}</span></div>
</div>"#,
                name = esc(&cert.name),
                issuer = esc(&cert.issuer),
                year = esc(&cert.year),
                status = esc(&cert.status),
            ));
        }
        inner.push_str("</div>");
        out.push_str(&card(LabelKey::Certifications, false, &inner));
    }

    // Skills
    let mut inner = String::from(r#"<div class="flex flex-wrap gap-2" data-field="skills">"#);
    for skill in doc.skills.technical.resolve(c.lang) {
        inner.push_str(&format!(
            r#"<span class="px-3 py-2 text-white rounded-full text-sm font-semibold" style="background-color: {}">{}</span>"#,
            t.chip_bg,
            esc(skill)
        ));
    }
    inner.push_str("</div>");
    out.push_str(&card(LabelKey::Skills, false, &inner));

    // Education
    if !doc.education.is_empty() {
        let mut inner = String::new();
        for edu in &doc.education {
            let year_line = match &edu.location {
                Some(location) => format!("{} • {}", esc(&edu.year), esc(location.resolve(c.lang))),
                None => esc(&edu.year),
            };
            inner.push_str(&format!(
                r#"<div class="mb-3 p-3 bg-white rounded-lg">
<h4 class="text-lg font-bold text-gray-800">{degree}</h4>
<p class="font-semibold" style="color: {accent}">{institution}</p>
<p class="text-gray-600 text-sm">{year_line}</p>"#,
                degree = esc(edu.degree.resolve(c.lang)),
                accent = t.accent,
                institution = esc(&edu.institution),
            ));
            if let Some(gpa) = &edu.gpa {
                inner.push_str(&format!(
                    r#"<p class="text-gray-500 text-xs">{}: {}</p>"#,
                    c.label(LabelKey::Gpa),
                    esc(gpa)
                ));
            }
            if let Some(coursework) = &edu.coursework {
                inner.push_str(&format!(
                    r#"<p class="text-gray-600 text-xs mt-1">{}: {}</p>"#,
                    c.label(LabelKey::Coursework),
                    esc(coursework.resolve(c.lang))
                ));
            }
            inner.push_str("</div>");
        }
        out.push_str(&card(LabelKey::Education, false, &inner));
    }

    // Awards
    if !doc.awards.is_empty() {
        let mut inner = String::new();
        for award in &doc.awards {
            inner.push_str(&format!(
                r#"<div class="mb-3 p-3 bg-white rounded-lg">
<h4 class="font-bold text-gray-800">{title}</h4>
<p class="text-gray-600 text-sm">{issuer} • {year}</p>
<p class="text-gray-700 text-sm mt-1">{description}</p>
</div>"#,
                title = esc(award.title.resolve(c.lang)),
                issuer = esc(&award.issuer),
                year = esc(&award.year),
                description = esc(award.description.resolve(c.lang)),
            ));
        }
        out.push_str(&card(LabelKey::Awards, false, &inner));
    }

    // References
    if !doc.references.is_empty() {
        let mut inner = String::from(r#"<div class="grid grid-cols-2 gap-4">"#);
        for reference in &doc.references {
            inner.push_str(&format!(
                r#"<div class="p-3 bg-white rounded-lg">
<h4 class="font-bold text-gray-800 text-sm">{name}</h4>
<p class="text-gray-600 text-xs">{position}</p>
<p class="text-gray-600 text-xs">{company}</p>
<p class="text-gray-500 text-xs mb-2">{relationship}</p>
<p class="text-gray-600 text-xs">{phone}</p>
<p class="text-gray-600 text-xs">{email}</p>
</div>"#,
                name = esc(&reference.name),
                position = esc(&reference.position),
                company = esc(&reference.company),
                relationship = esc(&reference.relationship),
                phone = esc(&reference.phone),
                email = esc(&reference.email),
            ));
        }
        inner.push_str("</div>");
        out.push_str(&card(LabelKey::References, false, &inner));
    }

    // Spoken languages
    let mut inner = String::from(r#"<div class="grid grid-cols-2 gap-3">"#);
    for spoken in doc.skills.languages.resolve(c.lang) {
        inner.push_str(&format!(
            r#"<div class="flex justify-between items-center p-2 bg-white rounded-lg">
<span class="font-semibold text-gray-800 text-sm">{language}</span>
<span class="text-white px-2 py-1 rounded-full text-xs" style="background-color: {chip}">{level}</span>
</div>"#,
            language = esc(&spoken.language),
            chip = t.chip_bg,
            level = esc(&spoken.level),
        ));
    }
    inner.push_str("</div>");
    out.push_str(&card(LabelKey::Languages, true, &inner));

    out.push_str("</div>");
    out
}

fn full_header(c: &Ctx) -> String {
    let p = &c.doc.personal;
    let t = &c.theme;
    let mut out = format!(
        r#"<header class="text-white p-6" style="background-color: {bg}">
<div class="flex justify-between items-start gap-4">
<div class="flex items-start gap-4 flex-1">"#,
        bg = t.header_bg
    );

    if let Some(photo) = &p.photo {
        out.push_str(&format!(
            r#"<img class="w-24 h-24 rounded-lg shrink-0" src="{}">"#,
            esc(photo)
        ));
    }

    out.push_str(&format!(
        r#"<div class="flex-1">
<h1 class="text-4xl font-bold mb-2" data-field="name">{name}</h1>
<h2 class="text-lg mb-3" data-field="title">{title}</h2>
<div class="text-sm">"#,
        name = esc(&p.name),
        title = esc(p.title.resolve(c.lang)),
    ));
    let identity = [
        (LabelKey::Born, p.born.as_ref().map(|b| b.resolve(c.lang).as_str())),
        (LabelKey::IdNumber, p.id_number.as_deref()),
        (
            LabelKey::DriverLicense,
            p.driver_license.as_ref().map(|d| d.resolve(c.lang).as_str()),
        ),
    ];
    for (key, value) in identity {
        if let Some(value) = value {
            out.push_str(&format!(
                r#"<p class="mb-1" data-field="{}">{}: {}</p>"#,
                key.key(),
                c.label(key),
                esc(value)
            ));
        }
    }
    out.push_str("</div></div></div>");

    // Contact pills
    out.push_str(r#"<div class="flex flex-col items-end gap-2 shrink-0">"#);
    let pill = |field: &str, text: &str| {
        format!(
            r#"<a class="px-2.5 py-1 rounded-full text-xs font-medium" style="background-color: rgba(255, 255, 255, 0.2)" data-field="{field}">{}</a>"#,
            esc(text)
        )
    };
    out.push_str(&pill("email", &p.email));
    out.push_str(&pill("phone", &p.phone));
    out.push_str(&pill("location", p.location.resolve(c.lang)));
    for link in &p.links {
        out.push_str(&pill("link", &link.label));
    }
    out.push_str("</div></div></header>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CvDocument {
        CvDocument::sample().unwrap()
    }

    #[test]
    fn root_direction_follows_language() {
        let doc = sample();
        for lang in Language::ALL {
            let visual = render(&doc, &Selection::new(lang, Layout::Full));
            let DomNode::Element(root) = &visual.nodes[0] else {
                panic!("Expected root element");
            };
            let expected = if lang == Language::Ar { "rtl" } else { "ltr" };
            assert_eq!(root.dir(), Some(expected));
        }
    }

    #[test]
    fn compact_caps_achievements() {
        let doc = sample();
        assert!(doc.experience[0].achievements.resolve(Language::En).len() > COMPACT_MAX_ACHIEVEMENTS);
        let compact = render(&doc, &Selection::new(Language::En, Layout::Compact));
        let full = render(&doc, &Selection::new(Language::En, Layout::Full));
        assert!(!compact.text_content().contains("Mentored four junior engineers"));
        assert!(full.text_content().contains("Mentored four junior engineers"));
    }

    #[test]
    fn compact_headings_are_upper_cased() {
        let visual = render(&sample(), &Selection::new(Language::En, Layout::Compact));
        assert!(visual.text_content().contains("WORK EXPERIENCE"));
        assert!(!visual.text_content().contains("AVAILABLE UPON REQUEST"));
        assert!(visual.text_content().contains("Available upon request"));
    }

    #[test]
    fn full_layout_lists_references_and_languages() {
        let visual = render(&sample(), &Selection::new(Language::Fr, Layout::Full));
        let text = visual.text_content();
        assert!(text.contains("John Smith"));
        assert!(text.contains("Langue maternelle"));
        assert!(text.contains("Professional References"));
    }

    #[test]
    fn user_text_is_escaped() {
        let mut doc = sample();
        doc.personal.name = "Ann <b>& Co".to_string();
        let visual = render(&doc, &Selection::default());
        assert!(visual.html.contains("Ann &lt;b&gt;&amp; Co"));
        assert_eq!(visual.field_text("name").as_deref(), Some("Ann <b>& Co"));
    }

    #[test]
    fn missing_translation_falls_back_in_output() {
        let visual = render(&sample(), &Selection::new(Language::It, Layout::Full));
        // No Italian achievements in the sample; the English ones are shown.
        assert!(visual.text_content().contains("Designed a log-structured block store"));
    }

    #[test]
    fn optional_identity_lines_render_only_when_present() {
        let mut doc = sample();
        let visual = render(&doc, &Selection::default());
        assert!(visual.field_text("born").is_some());
        assert!(visual.field_text("id_number").is_none());

        doc.personal.born = None;
        let visual = render(&doc, &Selection::default());
        assert!(visual.field_text("born").is_none());
    }
}
