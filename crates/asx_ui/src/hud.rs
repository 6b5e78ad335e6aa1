//! # HUD Views
//!
//! Page HUD content and the tree builders that render it.
//!
//! Every page may carry a `hud.content` object tagged by `type`. Rendering
//! produces a plain [`VNode`] tree that the runtime hands to the
//! reconciler. Interactive elements do not hold closures; they carry an
//! `onclick` attribute naming an input handler and a `data-arg` attribute
//! with its argument, which the host resolves through
//! [`DomSurface::listener`](crate::DomSurface::listener).
//!
//! | `type`        | View                                           |
//! |---------------|------------------------------------------------|
//! | `dashboard`   | grid of link cards                             |
//! | `store`       | optional hero + product cards with cart button |
//! | `chat`        | guide/examples sidebar + message log           |
//! | `menu`        | large link cards                               |
//! | `scene-info`  | bottom-left info panel                         |
//! | `status`      | top-right status panel                         |
//! | `diagnostics` | grid of labelled sections                      |

use serde::{Deserialize, Serialize};

use crate::style::{inline, Color, Theme};
use crate::vdom::{el, Primitive, VElement, VNode};

/// Input handler fired by store buttons.
pub const ADD_TO_CART: &str = "addToCart";

/// Input handler fired by dashboard and menu cards.
pub const NAVIGATE: &str = "navigate";

/// The `hud` block of a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hud {
    /// What to show. A HUD without content renders nothing.
    #[serde(default)]
    pub content: Option<HudContent>,
}

/// HUD content, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HudContent {
    /// Grid of navigation cards.
    Dashboard {
        /// Cards in display order.
        #[serde(default)]
        cards: Vec<LinkCard>,
    },
    /// Product listing.
    Store {
        /// Banner above the grid.
        #[serde(default)]
        hero: Option<Hero>,
        /// Products in display order.
        #[serde(default)]
        products: Vec<Product>,
    },
    /// Chat log with a help sidebar.
    Chat {
        /// Sidebar lists.
        #[serde(default)]
        sidebar: ChatSidebar,
        /// Messages, oldest first.
        #[serde(default)]
        messages: Vec<ChatMessage>,
    },
    /// Large navigation cards.
    Menu {
        /// Items in display order.
        #[serde(default)]
        items: Vec<LinkCard>,
    },
    /// Overlay describing the current scene.
    SceneInfo {
        /// Panel heading.
        #[serde(default)]
        title: String,
        /// `"Label: value"` lines.
        #[serde(default)]
        info: Vec<String>,
        /// Control hints.
        #[serde(default)]
        controls: Vec<String>,
    },
    /// Overlay with live status values.
    Status {
        /// Panel heading.
        #[serde(default)]
        title: String,
        /// Status rows.
        #[serde(default)]
        status: Vec<StatusItem>,
    },
    /// System diagnostics.
    Diagnostics {
        /// Sections in display order.
        #[serde(default)]
        sections: Vec<DiagnosticSection>,
    },
}

/// A card that navigates somewhere when clicked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkCard {
    /// Emoji or short glyph.
    pub icon: String,
    /// Heading.
    pub title: String,
    /// Body copy.
    pub description: String,
    /// Route to navigate to.
    pub link: String,
}

/// Store banner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hero {
    /// Heading.
    pub title: String,
    /// Sub-heading.
    pub subtitle: String,
}

/// A purchasable item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Identifier passed to the cart handler.
    pub id: Primitive,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Body copy.
    #[serde(default)]
    pub description: String,
    /// Emoji or short glyph.
    #[serde(default)]
    pub icon: String,
    /// Price in dollars.
    #[serde(default)]
    pub price: f64,
}

/// Sidebar lists of the chat view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSidebar {
    /// Guide bullet points.
    pub guide: Vec<String>,
    /// Example prompts.
    pub examples: Vec<String>,
}

/// One chat message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatMessage {
    /// `"system"`, `"user"`, `"assistant"`, ...
    pub role: String,
    /// Message body.
    pub content: String,
}

/// A row of the status panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusItem {
    /// Row label.
    pub label: String,
    /// Row value.
    pub value: Primitive,
    /// `"success"` renders the value in the accent colour.
    #[serde(default)]
    pub color: Option<String>,
}

/// A section of the diagnostics grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticSection {
    /// Heading.
    #[serde(default)]
    pub title: String,
    /// Badge text.
    #[serde(default)]
    pub status: String,
    /// Labelled values.
    #[serde(default)]
    pub items: Vec<LabeledValue>,
}

/// A label/value pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledValue {
    /// Label.
    pub label: String,
    /// Value.
    pub value: Primitive,
}

// ============================================================================
// RENDERING
// ============================================================================

/// Renders content with the default theme.
#[must_use]
pub fn render(content: &HudContent) -> VNode {
    render_with(&Theme::default(), content)
}

/// Renders the HUD container: scanline overlay followed by the content view.
#[must_use]
pub fn render_with(theme: &Theme, content: &HudContent) -> VNode {
    let view = match content {
        HudContent::Dashboard { cards } => dashboard(theme, cards),
        HudContent::Store { hero, products } => store(theme, hero.as_ref(), products),
        HudContent::Chat { sidebar, messages } => chat(theme, sidebar, messages),
        HudContent::Menu { items } => menu(theme, items),
        HudContent::SceneInfo { title, info, controls } => scene_info(theme, title, info, controls),
        HudContent::Status { title, status } => status_panel(theme, title, status),
        HudContent::Diagnostics { sections } => diagnostics(theme, sections),
    };

    styled(
        "div",
        "asx-hud",
        &[
            ("position", "absolute"),
            ("inset", "0"),
            ("padding", "20px"),
            ("overflow", "auto"),
            ("pointer-events", "auto"),
        ],
    )
    .child(scanlines())
    .child(view)
    .into()
}

/// The explicit error state shown when a page fails to render or mount.
#[must_use]
pub fn error_view(message: &str) -> VNode {
    let theme = Theme::default();
    let border = format!("2px solid {}", theme.error.css());
    let fill = theme.error_panel.css();
    let glow = Theme::glow(theme.error, 30, 0.8);

    styled(
        "div",
        "asx-error",
        &[
            ("position", "absolute"),
            ("top", "50%"),
            ("left", "50%"),
            ("transform", "translate(-50%, -50%)"),
            ("background", fill.as_str()),
            ("border", border.as_str()),
            ("padding", "30px"),
            ("text-align", "center"),
            ("box-shadow", glow.as_str()),
        ],
    )
    .child(heading("h2", &theme, theme.error, "ERROR"))
    .child(
        el("p")
            .prop("style", inline(&[("color", theme.error_text.css().as_str())]))
            .child(message),
    )
    .into()
}

fn styled(tag: &str, class: &str, declarations: &[(&str, &str)]) -> VElement {
    el(tag).prop("class", class).prop("style", inline(declarations))
}

fn scanlines() -> VElement {
    styled(
        "div",
        "asx-scanlines",
        &[
            ("position", "fixed"),
            ("inset", "0"),
            ("pointer-events", "none"),
            ("z-index", "1000"),
            (
                "background",
                "repeating-linear-gradient(0deg, rgba(0, 255, 255, 0.03) 0px, \
                 rgba(0, 255, 255, 0.03) 1px, transparent 1px, transparent 2px)",
            ),
        ],
    )
}

fn card(theme: &Theme, padding: &str) -> VElement {
    let fill = theme.panel.css();
    let border = format!("2px solid {}", theme.primary.css());
    let clip = Theme::notch(25);
    let glow = Theme::glow(theme.primary, 15, 0.3);
    styled(
        "div",
        "asx-card",
        &[
            ("background", fill.as_str()),
            ("border", border.as_str()),
            ("clip-path", clip.as_str()),
            ("padding", padding),
            ("box-shadow", glow.as_str()),
        ],
    )
}

fn grid(min_column: &str, max_width: &str) -> VElement {
    let columns = format!("repeat(auto-fit, minmax({min_column}, 1fr))");
    styled(
        "div",
        "asx-grid",
        &[
            ("display", "grid"),
            ("grid-template-columns", columns.as_str()),
            ("gap", "25px"),
            ("max-width", max_width),
            ("margin", "0 auto"),
        ],
    )
}

fn heading(tag: &str, theme: &Theme, color: Color, label: &str) -> VElement {
    el(tag)
        .prop(
            "style",
            inline(&[
                ("font-family", theme.display_font),
                ("color", color.css().as_str()),
                ("text-transform", "uppercase"),
            ]),
        )
        .child(label)
}

fn body(theme: &Theme, copy: &str) -> VElement {
    el("p")
        .prop("style", inline(&[("color", theme.text.css().as_str()), ("line-height", "1.6")]))
        .child(copy)
}

fn icon(glyph: &str) -> VElement {
    el("div").prop("class", "asx-icon").child(glyph)
}

fn link_card(theme: &Theme, item: &LinkCard, title_tag: &str) -> VElement {
    card(theme, "30px")
        .prop("onclick", NAVIGATE)
        .prop("data-arg", item.link.as_str())
        .child(icon(&item.icon))
        .child(heading(title_tag, theme, theme.primary, &item.title))
        .child(body(theme, &item.description))
}

fn dashboard(theme: &Theme, cards: &[LinkCard]) -> VElement {
    grid("300px", "1200px").children(cards.iter().map(|c| link_card(theme, c, "h2")))
}

fn menu(theme: &Theme, items: &[LinkCard]) -> VElement {
    grid("400px", "1200px").children(items.iter().map(|c| link_card(theme, c, "h2")))
}

fn store(theme: &Theme, hero: Option<&Hero>, products: &[Product]) -> VElement {
    let mut wrapper = styled("div", "asx-store", &[("max-width", "1400px"), ("margin", "0 auto")]);

    if let Some(hero) = hero {
        wrapper = wrapper.child(
            card(theme, "60px 40px")
                .prop("class", "asx-hero")
                .child(heading("h2", theme, theme.primary, &hero.title))
                .child(body(theme, &hero.subtitle)),
        );
    }

    let price_style = inline(&[
        ("font-family", theme.display_font),
        ("color", theme.accent.css().as_str()),
        ("font-weight", "700"),
    ]);
    let button_style = inline(&[
        ("font-family", theme.display_font),
        ("width", "100%"),
        ("color", theme.accent.css().as_str()),
        ("border", format!("2px solid {}", theme.accent.css()).as_str()),
        ("text-transform", "uppercase"),
    ]);

    let cards = products.iter().map(|product| {
        card(theme, "25px")
            .child(icon(&product.icon))
            .child(heading("h3", theme, theme.primary, &product.name))
            .child(body(theme, &product.description))
            .child(
                el("div")
                    .prop("class", "asx-price")
                    .prop("style", price_style.as_str())
                    .child(format!("${:.2}", product.price)),
            )
            .child(
                el("button")
                    .prop("style", button_style.as_str())
                    .prop("onclick", ADD_TO_CART)
                    .prop("data-arg", product.id.clone())
                    .child("ADD TO CART"),
            )
    });

    wrapper.child(grid("350px", "none").children(cards))
}

fn chat(theme: &Theme, sidebar: &ChatSidebar, messages: &[ChatMessage]) -> VElement {
    let item_style = inline(&[
        ("padding", "8px"),
        ("background", theme.inset.css().as_str()),
        ("border-left", format!("3px solid {}", theme.text.css()).as_str()),
        ("color", theme.text.css().as_str()),
    ]);
    let list = |items: &[String], quoted: bool| {
        el("ul").children(items.iter().map(|item| {
            let label = if quoted { format!("\"{item}\"") } else { item.clone() };
            el("li").prop("style", item_style.as_str()).child(label)
        }))
    };

    let side = styled("div", "asx-chat-sidebar", &[("width", "300px"), ("overflow-y", "auto")])
        .child(heading("h3", theme, theme.accent, "GUIDE"))
        .child(list(&sidebar.guide, false))
        .child(heading("h3", theme, theme.accent, "EXAMPLES"))
        .child(list(&sidebar.examples, true));

    let log = styled("div", "asx-chat-log", &[("flex", "1"), ("overflow-y", "auto")]).children(
        messages.iter().map(|msg| {
            let tone = if msg.role == "system" { theme.warning } else { theme.primary };
            el("div")
                .prop("class", "asx-message")
                .prop("data-role", msg.role.as_str())
                .prop("style", inline(&[("border", format!("2px solid {}", tone.css()).as_str())]))
                .child(heading("div", theme, tone, &msg.role.to_uppercase()))
                .child(body(theme, &msg.content))
        }),
    );

    styled("div", "asx-chat", &[("display", "flex"), ("height", "100%")])
        .child(side)
        .child(el("div").prop("class", "asx-chat-area").child(log))
}

fn scene_info(theme: &Theme, title: &str, info: &[String], controls: &[String]) -> VElement {
    let border = format!("2px solid {}", theme.accent.css());
    let lines = info.iter().map(|line| {
        let (label, value) = line.split_once(':').unwrap_or((line.as_str(), ""));
        el("p")
            .child(el("strong").child(format!("{label}:")))
            .child(format!(" {}", value.trim_start()))
    });
    let mut hints = el("div").prop("class", "asx-controls");
    for (i, hint) in controls.iter().enumerate() {
        if i > 0 {
            hints = hints.child(el("br"));
        }
        hints = hints.child(hint.as_str());
    }

    styled(
        "div",
        "asx-scene-info",
        &[
            ("position", "absolute"),
            ("bottom", "20px"),
            ("left", "20px"),
            ("border", border.as_str()),
            ("min-width", "300px"),
        ],
    )
    .child(heading("h3", theme, theme.accent, title))
    .children(lines)
    .child(hints)
}

fn status_panel(theme: &Theme, title: &str, rows: &[StatusItem]) -> VElement {
    let border = format!("2px solid {}", theme.warning.css());
    styled(
        "div",
        "asx-status",
        &[
            ("position", "absolute"),
            ("top", "80px"),
            ("right", "20px"),
            ("border", border.as_str()),
            ("pointer-events", "none"),
        ],
    )
    .child(heading("h4", theme, theme.warning, title))
    .children(rows.iter().map(|row| {
        let tone = if row.color.as_deref() == Some("success") {
            theme.accent
        } else {
            theme.primary
        };
        el("div")
            .prop("class", "asx-status-row")
            .child(format!("{}: ", row.label))
            .child(
                el("span")
                    .prop("style", inline(&[("color", tone.css().as_str()), ("font-weight", "bold")]))
                    .child(row.value.clone()),
            )
    }))
}

fn diagnostics(theme: &Theme, sections: &[DiagnosticSection]) -> VElement {
    grid("400px", "1400px").children(sections.iter().map(|section| {
        let header = el("div")
            .prop("class", "asx-section-header")
            .child(heading("h2", theme, theme.primary, &section.title))
            .child(el("span").prop("class", "asx-badge").child(section.status.as_str()));
        card(theme, "25px").child(header).children(section.items.iter().map(|item| {
            el("div")
                .prop("class", "asx-diag-item")
                .child(el("div").prop("class", "asx-label").child(item.label.as_str()))
                .child(el("div").prop("class", "asx-value").child(item.value.clone()))
        }))
    }))
}
