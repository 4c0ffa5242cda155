use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// A meme template record.
///
/// `image_ref` points at the canonical template image; fetching and caching
/// it is the storage layer's business, the record only carries the
/// reference. `prompt` exists solely for templates that ship generative
/// guidance — the classic pipeline ignores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

pub static BUILTIN_TEMPLATES: Lazy<Vec<Template>> = Lazy::new(|| {
    vec![
        Template {
            id: "doge".into(),
            name: "Doge".into(),
            description: "The iconic shiba inu meme that took over the internet and became a viral sensation".into(),
            image_ref: "https://static.databutton.com/public/ec7be075-eaf6-40e6-b540-920274c1dc36/doge_classic.jpg".into(),
            prompt: None,
        },
        Template {
            id: "pepe".into(),
            name: "Pepe".into(),
            description: "The internet's favorite green frog character used in countless viral memes".into(),
            image_ref: "https://static.databutton.com/public/ec7be075-eaf6-40e6-b540-920274c1dc36/pepe_classic.png".into(),
            prompt: None,
        },
        Template {
            id: "anime".into(),
            name: "Anime".into(),
            description: "Transform your photo into a stylized anime character with distinct artistic features".into(),
            image_ref: "https://static.databutton.com/public/ec7be075-eaf6-40e6-b540-920274c1dc36/anime_classic.webp".into(),
            prompt: None,
        },
        Template {
            id: "btc_laser_eyes".into(),
            name: "Laser Eyes".into(),
            description: "Add intense glowing laser eyes to your portrait for a dramatic viral meme effect".into(),
            image_ref: "https://static.databutton.com/public/ec7be075-eaf6-40e6-b540-920274c1dc36/laser_eyes_generic.jpg".into(),
            prompt: None,
        },
        Template {
            id: "voxel".into(),
            name: "Voxel Art".into(),
            description: "Transform your photo into vibrant 3D voxel art with stylized elements".into(),
            image_ref: "https://static.databutton.com/public/ec7be075-eaf6-40e6-b540-920274c1dc36/voxel_example.webp".into(),
            prompt: Some(
                "Transform the user's image accurately into a detailed voxel art style. \
                 Precisely preserve original facial features, including facial expressions, \
                 hairstyle, eyes, mouth, and nose shape. Apply vibrant, cube-based voxel \
                 aesthetics and textures, creating a playful 3D pixelated appearance similar \
                 to game art. Add subtle stylized elements or patterns in the background. \
                 Fully retain the original photo composition while adding these elements."
                    .into(),
            ),
        },
    ]
});

pub fn find(id: &str) -> Option<&'static Template> {
    BUILTIN_TEMPLATES.iter().find(|t| t.id == id)
}
