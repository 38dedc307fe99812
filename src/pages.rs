//! Server-rendered portfolio page.
//!
//! The page is a single document with one section per part of the profile
//! plus the chat widget mount point. Scroll animations and the widget's
//! behaviour live in `/static/site.js`.

use std::fmt::Write as _;

use crate::content::{Experience, Profile, Project, Skill};

/// Escape text for use in HTML content and attribute values.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the whole page.
#[must_use]
pub fn render_index(profile: &Profile, contact_enabled: bool) -> String {
    let mut content = String::new();
    content.push_str(&hero_section(profile));
    content.push_str(&projects_section(&profile.projects));
    content.push_str(&experience_section(&profile.experience));
    content.push_str(&about_section(profile));
    content.push_str(&contact_section(profile, contact_enabled));
    content.push_str(&chat_widget(profile));

    html_shell(&profile.owner.name, &profile.owner.headline, &content)
}

/// Generate the HTML shell for the page.
fn html_shell(owner: &str, headline: &str, content: &str) -> String {
    let owner = escape_html(owner);
    let headline = escape_html(headline);
    format!(
        r##"<!DOCTYPE html>
<html lang="en" class="dark">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="description" content="{owner} - {headline}">
    <title>{owner} - {headline}</title>
    <link rel="stylesheet" href="/static/site.css">
    <script defer src="/static/site.js"></script>
</head>
<body class="min-h-screen bg-background text-foreground antialiased">
    <nav class="site-nav">
        <a href="#hero">Home</a>
        <a href="#projects">Projects</a>
        <a href="#experience">Experience</a>
        <a href="#about">About</a>
        <a href="#contact">Contact</a>
    </nav>
    <main id="app">
{content}
    </main>
    <footer class="site-footer">
        <p>&copy; {owner}</p>
    </footer>
</body>
</html>"##
    )
}

fn link_button(href: Option<&str>, label: &str) -> String {
    href.map(|href| {
        format!(
            r#"<a class="icon-link" href="{}" target="_blank" rel="noopener noreferrer" aria-label="{label}">{label}</a>"#,
            escape_html(href)
        )
    })
    .unwrap_or_default()
}

fn hero_section(profile: &Profile) -> String {
    let owner = &profile.owner;
    let links = [
        link_button(owner.links.linkedin.as_deref(), "LinkedIn"),
        link_button(owner.links.github.as_deref(), "GitHub"),
        link_button(owner.links.resume.as_deref(), "Resume"),
    ]
    .concat();

    format!(
        r##"<section id="hero" class="hero reveal">
    <h1 class="hero-title">{headline}</h1>
    <p class="hero-tagline">{tagline}</p>
    <div class="hero-links">{links}</div>
    <a class="scroll-hint" href="#projects">Scroll to explore</a>
</section>
"##,
        headline = escape_html(&owner.headline),
        tagline = escape_html(&owner.tagline),
    )
}

fn project_card(index: usize, project: &Project) -> String {
    let tech: String = project
        .tech
        .iter()
        .map(|t| format!(r#"<span class="chip">{}</span>"#, escape_html(t)))
        .collect();
    let image = project
        .image
        .as_deref()
        .map(|src| {
            format!(
                r#"<img src="{}" alt="{}" loading="lazy">"#,
                escape_html(src),
                escape_html(&project.title)
            )
        })
        .unwrap_or_default();
    let links = [
        link_button(project.github.as_deref(), "View Source Code"),
        link_button(project.live.as_deref(), "View Live Project"),
    ]
    .concat();

    format!(
        r#"<article class="project-card reveal" style="--delay:{delay}ms">
    {image}
    <div class="project-links">{links}</div>
    <h3>{title}</h3>
    <p>{description}</p>
    <div class="chips">{tech}</div>
</article>
"#,
        delay = index * 200,
        title = escape_html(&project.title),
        description = escape_html(&project.description),
    )
}

fn projects_section(projects: &[Project]) -> String {
    let cards: String = projects
        .iter()
        .enumerate()
        .map(|(i, p)| project_card(i, p))
        .collect();
    format!(
        r#"<section id="projects" class="section">
    <h2 class="reveal">Featured <span class="gradient-text">Projects</span></h2>
    <div class="project-grid">
{cards}    </div>
</section>
"#
    )
}

fn experience_entry(index: usize, entry: &Experience) -> String {
    let achievements: String = entry
        .achievements
        .iter()
        .map(|a| format!("<li>{}</li>", escape_html(a)))
        .collect();
    let side = if index % 2 == 0 { "left" } else { "right" };

    format!(
        r#"<li class="timeline-entry {kind} {side} reveal">
    <span class="timeline-duration">{duration}</span>
    <h3>{role}</h3>
    <p class="timeline-company">{company}</p>
    <p>{description}</p>
    <ul>{achievements}</ul>
</li>
"#,
        kind = entry.kind.css_class(),
        duration = escape_html(&entry.duration),
        role = escape_html(&entry.role),
        company = escape_html(&entry.company),
        description = escape_html(&entry.description),
    )
}

fn experience_section(experience: &[Experience]) -> String {
    let entries: String = experience
        .iter()
        .enumerate()
        .map(|(i, e)| experience_entry(i, e))
        .collect();
    format!(
        r#"<section id="experience" class="section">
    <h2 class="reveal">Experience &amp; <span class="gradient-text">Achievements</span></h2>
    <ol class="timeline">
{entries}    </ol>
</section>
"#
    )
}

fn skill_card(skill: &Skill) -> String {
    format!(
        r#"<div class="skill-card reveal"><h4>{}</h4><p>{}</p></div>"#,
        escape_html(&skill.name),
        escape_html(&skill.description)
    )
}

fn about_section(profile: &Profile) -> String {
    let mut paragraphs = String::new();
    for p in &profile.about {
        let _ = writeln!(paragraphs, "    <p class=\"reveal\">{}</p>", escape_html(p));
    }
    if let Some(quote) = &profile.quote {
        let _ = writeln!(
            paragraphs,
            "    <blockquote class=\"reveal\">&quot;{}&quot;</blockquote>",
            escape_html(quote)
        );
    }
    let skills: String = profile.skills.iter().map(skill_card).collect();

    format!(
        r#"<section id="about" class="section">
    <h2 class="reveal">About <span class="gradient-text">Me</span></h2>
{paragraphs}    {connect}
    <h3 class="reveal">Technical <span class="gradient-text">Expertise</span></h3>
    <div class="skill-grid">{skills}</div>
</section>
"#,
        connect = link_button(profile.owner.links.linkedin.as_deref(), "Let's Connect"),
    )
}

fn contact_section(profile: &Profile, enabled: bool) -> String {
    let owner = &profile.owner;
    let phone = owner
        .phone
        .as_deref()
        .map(|p| format!("<li><h4>Phone</h4><p>{}</p></li>", escape_html(p)))
        .unwrap_or_default();
    let form = if enabled {
        r#"<form id="contact-form" class="contact-form" novalidate>
        <input name="name" type="text" placeholder="Your Name" required>
        <input name="email" type="email" placeholder="Your Email" required>
        <textarea name="message" rows="5" placeholder="Your Message" required></textarea>
        <button type="submit">Send Message</button>
        <p class="form-status" role="status" aria-live="polite"></p>
    </form>"#
    } else {
        r#"<p class="muted">The contact form is currently unavailable. Please email me directly.</p>"#
    };

    format!(
        r#"<section id="contact" class="section">
    <h2 class="reveal">Let's <span class="gradient-text">Connect</span></h2>
    <div class="contact-grid">
    <ul class="contact-details reveal">
        <li><h4>Email</h4><a href="mailto:{email}">{email}</a></li>
        {phone}
        <li><h4>Location</h4><p>{location}</p></li>
    </ul>
    {form}
    </div>
</section>
"#,
        email = escape_html(&owner.email),
        location = escape_html(&owner.location),
    )
}

fn chat_widget(profile: &Profile) -> String {
    format!(
        r#"<div id="chat-widget" class="chat-widget" data-open="false">
    <button class="chat-toggle" type="button" aria-label="Open chat">&#129302;</button>
    <div class="chat-window" hidden>
        <header class="chat-header">
            <h3>{title}</h3>
            <button class="chat-close" type="button" aria-label="Close chat">&times;</button>
        </header>
        <div class="chat-messages" aria-live="polite"></div>
        <p class="chat-typing" hidden><span>.</span><span>.</span><span>.</span></p>
        <p class="chat-error" hidden></p>
        <form class="chat-input">
            <input name="message" type="text" placeholder="Type your message..." autocomplete="off">
            <button type="submit" disabled>Send</button>
        </form>
    </div>
</div>
"#,
        title = escape_html(&profile.assistant.title),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_index_contains_every_section() {
        let profile = Profile::builtin().unwrap();
        let html = render_index(&profile, true);

        for id in ["hero", "projects", "experience", "about", "contact", "chat-widget"] {
            assert!(html.contains(&format!("id=\"{id}\"")), "missing section {id}");
        }
        assert!(html.contains("DataGenKit"));
        assert!(html.contains("Jay&#39;s Assistant"));
        assert!(html.contains("contact-form"));
        assert!(!html.contains("system_prompt"));
    }

    #[test]
    fn test_nav_links_target_sections() {
        let profile = Profile::builtin().unwrap();
        let html = render_index(&profile, true);

        for id in ["hero", "projects", "experience", "about", "contact"] {
            assert!(html.contains(&format!("href=\"#{id}\"")), "missing nav link to {id}");
        }
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_contact_form_hidden_when_disabled() {
        let profile = Profile::builtin().unwrap();
        let html = render_index(&profile, false);
        assert!(!html.contains("id=\"contact-form\""));
    }

    #[test]
    fn test_profile_text_is_escaped() {
        let mut profile = Profile::builtin().unwrap();
        profile.projects[0].title = "<script>x</script>".to_string();
        let html = render_index(&profile, true);
        assert!(!html.contains("<script>x</script>"));
        assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
    }
}
