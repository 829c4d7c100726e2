use serde::Serialize;

use crate::builder::TemplateChoice;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Palette {
    pub header_bg: &'static str,
    pub header_text: &'static str,
    pub sidebar_bg: &'static str,
    pub sidebar_text: &'static str,
    pub accent: &'static str,
    pub heading: &'static str,
    pub body_text: &'static str,
    pub muted_text: &'static str,
}

/// Section headings printed by a template.
#[derive(Debug, Clone, Copy)]
pub struct Labels {
    pub contact: &'static str,
    pub skills: &'static str,
    pub summary: &'static str,
    pub education: &'static str,
    pub experience: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct PlaceholderEntry {
    pub title: &'static str,
    pub period: &'static str,
    pub subtitle: &'static str,
    pub detail: Option<&'static str>,
}

/// Canned text shown wherever the form has nothing yet.
#[derive(Debug, Clone, Copy)]
pub struct Placeholders {
    pub name: &'static str,
    pub profession: &'static str,
    pub phone: &'static str,
    pub email: &'static str,
    pub address: &'static str,
    pub summary: &'static str,
    pub skills: &'static [&'static str],
    pub education: PlaceholderEntry,
    pub experience: PlaceholderEntry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Sidebar,
    Main,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Contact,
    Skills,
    Summary,
    Education,
    Experience,
}

#[derive(Debug, Clone, Copy)]
pub struct TemplateDef {
    pub id: &'static str,
    pub palette: Palette,
    pub labels: Labels,
    pub placeholders: Placeholders,
    pub has_photo: bool,
    /// Sidebar width as a percentage of the page.
    pub sidebar_width: u8,
    pub sections: &'static [(Region, SectionKind)],
}

const SHARED_CONTACT_PLACEHOLDERS: (&str, &str, &str) = (
    "+123-456-7890",
    "hello@reallygreatsite.com",
    "123 Anywhere St., Any City",
);

pub const PHOTO_WARM: TemplateDef = TemplateDef {
    id: "photo-warm",
    palette: Palette {
        header_bg: "#C18F76",
        header_text: "#FFFFFF",
        sidebar_bg: "#FAE8D4",
        sidebar_text: "#3E2723",
        accent: "#D4A373",
        heading: "#3E2723",
        body_text: "#333333",
        muted_text: "#666666",
    },
    labels: Labels {
        contact: "CONTACT",
        skills: "SKILLS",
        summary: "PERSONAL INFO",
        education: "EDUCATION",
        experience: "EXPERIENCE",
    },
    placeholders: Placeholders {
        name: "RADHIKA KUMARI",
        profession: "GRAPHIC DESIGNER",
        phone: SHARED_CONTACT_PLACEHOLDERS.0,
        email: SHARED_CONTACT_PLACEHOLDERS.1,
        address: SHARED_CONTACT_PLACEHOLDERS.2,
        summary: "I am a passionate Graphic & Branding Designer having expertise of 5+ years. \
                  I work closely with my clients in developing strong brand identities.",
        skills: &["Graphic Design", "Visual Design", "Branding Design"],
        education: PlaceholderEntry {
            title: "Advance Diploma in Graphic Design",
            period: "2015-2017",
            subtitle: "University Name",
            detail: None,
        },
        experience: PlaceholderEntry {
            title: "Social Media Manager",
            period: "2020-Present",
            subtitle: "Studio Shodwe",
            detail: Some("Led a team of 3 designers to develop digital media resources."),
        },
    },
    has_photo: true,
    sidebar_width: 35,
    sections: &[
        (Region::Sidebar, SectionKind::Contact),
        (Region::Sidebar, SectionKind::Skills),
        (Region::Main, SectionKind::Summary),
        (Region::Main, SectionKind::Education),
        (Region::Main, SectionKind::Experience),
    ],
};

pub const CLASSIC_NAVY: TemplateDef = TemplateDef {
    id: "classic-navy",
    palette: Palette {
        header_bg: "#1E3A5F",
        header_text: "#FFFFFF",
        sidebar_bg: "#F7FAFC",
        sidebar_text: "#333333",
        accent: "#A0AEC0",
        heading: "#1E3A5F",
        body_text: "#333333",
        muted_text: "#666666",
    },
    labels: Labels {
        contact: "CONTACT",
        skills: "SKILLS",
        summary: "PROFILE",
        education: "EDUCATION",
        experience: "WORK EXPERIENCE",
    },
    placeholders: Placeholders {
        name: "FULL NAME",
        profession: "PROFESSIONAL",
        phone: SHARED_CONTACT_PLACEHOLDERS.0,
        email: SHARED_CONTACT_PLACEHOLDERS.1,
        address: SHARED_CONTACT_PLACEHOLDERS.2,
        summary: "Results-driven professional with a track record of delivering quality work \
                  and collaborating across teams.",
        skills: &["Communication", "Problem Solving", "Teamwork"],
        education: PlaceholderEntry {
            title: "Bachelor's Degree",
            period: "2015-2019",
            subtitle: "University Name",
            detail: None,
        },
        experience: PlaceholderEntry {
            title: "Job Position",
            period: "2020-Present",
            subtitle: "Company Name",
            detail: Some("Describe your responsibilities and achievements."),
        },
    },
    has_photo: false,
    sidebar_width: 38,
    sections: &[
        (Region::Sidebar, SectionKind::Contact),
        (Region::Sidebar, SectionKind::Education),
        (Region::Sidebar, SectionKind::Skills),
        (Region::Main, SectionKind::Summary),
        (Region::Main, SectionKind::Experience),
    ],
};

pub fn template_for(choice: TemplateChoice) -> &'static TemplateDef {
    match choice {
        TemplateChoice::WithPhoto => &PHOTO_WARM,
        TemplateChoice::WithoutPhoto => &CLASSIC_NAVY,
    }
}

impl Labels {
    pub fn for_section(&self, kind: SectionKind) -> &'static str {
        match kind {
            SectionKind::Contact => self.contact,
            SectionKind::Skills => self.skills,
            SectionKind::Summary => self.summary,
            SectionKind::Education => self.education,
            SectionKind::Experience => self.experience,
        }
    }
}
