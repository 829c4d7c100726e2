//! Resolved layout tree for a CV.
//!
//! Both export paths (HTML/PDF and PNG) consume a [`LayoutDocument`], so the
//! image and the document always show the same data. Building the tree is a
//! pure function of the form content, the template choice and the photo.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bytes::Bytes;
use serde::Serialize;

use crate::builder::TemplateChoice;
use crate::models::cv::CvContent;
use crate::render::templates::{
    template_for, Palette, PlaceholderEntry, Region, SectionKind, TemplateDef,
};

#[derive(Debug, Clone)]
pub struct Photo {
    pub content_type: String,
    pub bytes: Bytes,
}

impl Photo {
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.content_type, BASE64.encode(&self.bytes))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Text {
    pub value: String,
    pub placeholder: bool,
}

impl Text {
    fn real(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            placeholder: false,
        }
    }

    fn canned(value: &str) -> Self {
        Self {
            value: value.to_string(),
            placeholder: true,
        }
    }

    fn or_placeholder(value: &str, placeholder: &str) -> Self {
        if value.trim().is_empty() {
            Self::canned(placeholder)
        } else {
            Self::real(value)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PhotoSlot {
    Image { src: String },
    Placeholder,
}

#[derive(Debug, Clone, Serialize)]
pub struct Header {
    pub name: Text,
    pub title: Text,
    pub photo: Option<PhotoSlot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactIcon {
    Phone,
    Email,
    Location,
    Link,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub title: String,
    pub period: String,
    pub subtitle: String,
    pub detail: Option<String>,
    pub placeholder: bool,
}

impl From<&PlaceholderEntry> for Entry {
    fn from(p: &PlaceholderEntry) -> Self {
        Self {
            title: p.title.to_string(),
            period: p.period.to_string(),
            subtitle: p.subtitle.to_string(),
            detail: p.detail.map(str::to_string),
            placeholder: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Contact { icon: ContactIcon, text: Text },
    Bullet { text: Text },
    Paragraph { text: Text },
    Entry(Entry),
}

#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub heading: &'static str,
    pub blocks: Vec<Block>,
}

impl Section {
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Entry(e) => Some(e),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LayoutDocument {
    pub template_id: &'static str,
    pub palette: Palette,
    pub sidebar_width: u8,
    pub header: Header,
    pub sidebar: Vec<Section>,
    pub main: Vec<Section>,
}

impl LayoutDocument {
    pub fn section(&self, heading: &str) -> Option<&Section> {
        self.sidebar
            .iter()
            .chain(self.main.iter())
            .find(|s| s.heading == heading)
    }
}

pub fn build_layout(
    content: &CvContent,
    choice: TemplateChoice,
    photo: Option<&Photo>,
) -> LayoutDocument {
    let def = template_for(choice);
    let ph = &def.placeholders;
    let info = &content.personal_info;

    let header = Header {
        name: Text::or_placeholder(&info.full_name.to_uppercase(), ph.name),
        title: Text::or_placeholder(&info.profession.to_uppercase(), ph.profession),
        photo: def.has_photo.then(|| match photo {
            Some(p) => PhotoSlot::Image { src: p.data_uri() },
            None => PhotoSlot::Placeholder,
        }),
    };

    let mut sidebar = Vec::new();
    let mut main = Vec::new();
    for (region, kind) in def.sections {
        let section = Section {
            heading: def.labels.for_section(*kind),
            blocks: section_blocks(def, *kind, content),
        };
        match region {
            Region::Sidebar => sidebar.push(section),
            Region::Main => main.push(section),
        }
    }

    LayoutDocument {
        template_id: def.id,
        palette: def.palette,
        sidebar_width: def.sidebar_width,
        header,
        sidebar,
        main,
    }
}

fn section_blocks(def: &TemplateDef, kind: SectionKind, content: &CvContent) -> Vec<Block> {
    let ph = &def.placeholders;
    let info = &content.personal_info;

    match kind {
        SectionKind::Contact => {
            let mut blocks = vec![
                Block::Contact {
                    icon: ContactIcon::Phone,
                    text: Text::or_placeholder(&info.phone, ph.phone),
                },
                Block::Contact {
                    icon: ContactIcon::Email,
                    text: Text::or_placeholder(&info.email, ph.email),
                },
                Block::Contact {
                    icon: ContactIcon::Location,
                    text: Text::or_placeholder(&info.address, ph.address),
                },
            ];
            for link in [&info.linkedin, &info.portfolio].into_iter().flatten() {
                if !link.trim().is_empty() {
                    blocks.push(Block::Contact {
                        icon: ContactIcon::Link,
                        text: Text::real(link.as_str()),
                    });
                }
            }
            blocks
        }
        SectionKind::Skills => {
            if content.skills.is_empty() {
                ph.skills
                    .iter()
                    .map(|s| Block::Bullet { text: Text::canned(s) })
                    .collect()
            } else {
                content
                    .skills
                    .iter()
                    .map(|s| Block::Bullet {
                        text: Text::real(s.name.as_str()),
                    })
                    .collect()
            }
        }
        SectionKind::Summary => vec![Block::Paragraph {
            text: Text::or_placeholder(&content.summary, ph.summary),
        }],
        SectionKind::Education => {
            if content.education.is_empty() {
                return vec![Block::Entry((&ph.education).into())];
            }
            content
                .education
                .iter()
                .map(|e| {
                    let title = if e.field.trim().is_empty() {
                        e.degree.clone()
                    } else {
                        format!("{} in {}", e.degree, e.field)
                    };
                    let detail = e
                        .gpa
                        .as_deref()
                        .filter(|g| !g.trim().is_empty())
                        .map(|g| format!("GPA: {}", g));
                    Block::Entry(Entry {
                        title,
                        period: e.period(),
                        subtitle: e.institution.clone(),
                        detail,
                        placeholder: false,
                    })
                })
                .collect()
        }
        SectionKind::Experience => {
            if content.experience.is_empty() {
                return vec![Block::Entry((&ph.experience).into())];
            }
            content
                .experience
                .iter()
                .map(|e| {
                    Block::Entry(Entry {
                        title: e.position.clone(),
                        period: e.period(),
                        subtitle: e.company.clone(),
                        detail: Some(e.description.clone()).filter(|d| !d.trim().is_empty()),
                        placeholder: false,
                    })
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cv::{Experience, PersonalInfo, Skill, SkillLevel};

    fn experience_section(doc: &LayoutDocument) -> Vec<Entry> {
        let heading = if doc.template_id == "photo-warm" {
            "EXPERIENCE"
        } else {
            "WORK EXPERIENCE"
        };
        doc.section(heading)
            .expect("experience section")
            .entries()
            .cloned()
            .collect()
    }

    #[test]
    fn empty_form_renders_placeholders_everywhere() {
        for choice in [TemplateChoice::WithPhoto, TemplateChoice::WithoutPhoto] {
            let doc = build_layout(&CvContent::default(), choice, None);
            assert!(doc.header.name.placeholder);
            assert!(doc.header.title.placeholder);

            let entries = experience_section(&doc);
            assert_eq!(entries.len(), 1);
            assert!(entries[0].placeholder);

            let skills = doc.section("SKILLS").unwrap();
            assert_eq!(skills.blocks.len(), 3);
        }
    }

    #[test]
    fn one_real_experience_replaces_placeholder() {
        let mut content = CvContent::default();
        let mut exp = Experience::blank("x".into());
        exp.position = "Backend Engineer".into();
        exp.company = "Acme".into();
        exp.start_date = "2021".into();
        content.experience.push(exp);

        let doc = build_layout(&content, TemplateChoice::WithPhoto, None);
        let entries = experience_section(&doc);
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].placeholder);
        assert_eq!(entries[0].title, "Backend Engineer");
        assert_eq!(entries[0].period, "2021-Present");
        assert_eq!(entries[0].detail, None);
    }

    #[test]
    fn templates_differ_in_layout_and_labels() {
        let content = CvContent::default();
        let warm = build_layout(&content, TemplateChoice::WithPhoto, None);
        let navy = build_layout(&content, TemplateChoice::WithoutPhoto, None);

        assert!(matches!(warm.header.photo, Some(PhotoSlot::Placeholder)));
        assert!(navy.header.photo.is_none());
        assert_ne!(warm.palette, navy.palette);
        assert!(warm.section("PERSONAL INFO").is_some());
        assert!(navy.section("PROFILE").is_some());
        assert!(navy.sidebar.iter().any(|s| s.heading == "EDUCATION"));
        assert!(warm.main.iter().any(|s| s.heading == "EDUCATION"));
    }

    #[test]
    fn real_values_are_used_and_uppercased() {
        let content = CvContent {
            personal_info: PersonalInfo {
                full_name: "Ana Putri".into(),
                profession: "Designer".into(),
                email: "ana@example.com".into(),
                phone: "0812".into(),
                address: "Bandung".into(),
                linkedin: Some("linkedin.com/in/ana".into()),
                portfolio: None,
            },
            skills: vec![Skill {
                name: "Figma".into(),
                level: SkillLevel::Expert,
            }],
            ..Default::default()
        };
        let doc = build_layout(&content, TemplateChoice::WithoutPhoto, None);
        assert_eq!(doc.header.name, Text::real("ANA PUTRI"));
        assert_eq!(doc.header.title.value, "DESIGNER");

        let contact = doc.section("CONTACT").unwrap();
        assert_eq!(contact.blocks.len(), 4);
        let skills = doc.section("SKILLS").unwrap();
        assert_eq!(skills.blocks.len(), 1);
    }

    #[test]
    fn photo_becomes_data_uri() {
        let photo = Photo {
            content_type: "image/png".into(),
            bytes: Bytes::from_static(b"abc"),
        };
        let doc = build_layout(&CvContent::default(), TemplateChoice::WithPhoto, Some(&photo));
        match doc.header.photo {
            Some(PhotoSlot::Image { src }) => assert_eq!(src, "data:image/png;base64,YWJj"),
            other => panic!("unexpected photo slot: {:?}", other),
        }
    }
}
