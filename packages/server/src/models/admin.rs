//! Admin schema: the field layout of each catalog model as an admin client
//! needs it to render list, detail and edit views.

use serde::Serialize;
use utoipa::ToSchema;

use crate::entity::{tag, video};

/// Video fields maintained by the system and never accepted from a form.
pub const VIDEO_READ_ONLY_FIELDS: &[&str] = &["num_views", "num_likes", "published_at"];

/// Storage kind of a field, as a form renderer sees it.
#[derive(Serialize, ToSchema, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Integer,
    Char,
    Text,
    Slug,
    Image,
    File,
    DateTime,
    Boolean,
    ManyToMany,
}

#[derive(Serialize, ToSchema, Clone, Debug)]
pub struct FieldSpec {
    #[schema(example = "title")]
    pub name: &'static str,
    #[schema(example = "Título")]
    pub verbose_name: &'static str,
    pub kind: FieldKind,
    /// Must be supplied when creating a record.
    pub required: bool,
    /// Shown in the admin but never accepted on create or update.
    pub read_only: bool,
    pub unique: bool,
    #[schema(example = 100)]
    pub max_length: Option<usize>,
    /// Media directory for file fields.
    #[schema(example = "thumbnails/")]
    pub upload_to: Option<&'static str>,
    /// Target model for relation fields.
    #[schema(example = "tag")]
    pub related_model: Option<&'static str>,
}

impl FieldSpec {
    fn new(name: &'static str, verbose_name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            verbose_name,
            kind,
            required: true,
            read_only: false,
            unique: false,
            max_length: None,
            upload_to: None,
            related_model: None,
        }
    }

    fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    fn read_only(mut self) -> Self {
        self.read_only = true;
        self.required = false;
        self
    }

    fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    fn max_length(mut self, len: usize) -> Self {
        self.max_length = Some(len);
        self
    }

    fn upload_to(mut self, dir: &'static str) -> Self {
        self.upload_to = Some(dir);
        self
    }

    fn related(mut self, model: &'static str) -> Self {
        self.related_model = Some(model);
        self
    }
}

#[derive(Serialize, ToSchema, Clone, Debug)]
pub struct ModelSpec {
    #[schema(example = "video")]
    pub name: &'static str,
    #[schema(example = "Vídeo")]
    pub verbose_name: &'static str,
    #[schema(example = "Vídeos")]
    pub verbose_name_plural: &'static str,
    /// Field used as the record's display string.
    #[schema(example = "title")]
    pub display_field: &'static str,
    pub fields: Vec<FieldSpec>,
}

impl ModelSpec {
    /// Fields an admin form may submit.
    pub fn editable_fields(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|f| !f.read_only && f.name != "id")
            .map(|f| f.name)
            .collect()
    }

    pub fn read_only_fields(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|f| f.read_only)
            .map(|f| f.name)
            .collect()
    }
}

/// `GET /admin/schema` response.
#[derive(Serialize, ToSchema)]
pub struct AdminSchemaResponse {
    pub models: Vec<ModelSpec>,
}

pub fn video_model() -> ModelSpec {
    ModelSpec {
        name: "video",
        verbose_name: "Vídeo",
        verbose_name_plural: "Vídeos",
        display_field: "title",
        fields: vec![
            FieldSpec::new("id", "ID", FieldKind::Integer).read_only(),
            FieldSpec::new("title", "Título", FieldKind::Char)
                .unique()
                .max_length(video::TITLE_MAX_LEN),
            FieldSpec::new("description", "Descrição", FieldKind::Text),
            FieldSpec::new("thumbnail", "Miniatura", FieldKind::Image)
                .upload_to("thumbnails/"),
            FieldSpec::new("video", "Video", FieldKind::File).upload_to("videos/"),
            FieldSpec::new("slug", "slug", FieldKind::Slug)
                .unique()
                .max_length(video::SLUG_MAX_LEN),
            FieldSpec::new("published_at", "Publicado em", FieldKind::DateTime).read_only(),
            FieldSpec::new("is_published", "Está publicado?", FieldKind::Boolean).optional(),
            FieldSpec::new("num_likes", "Número de curtidas", FieldKind::Integer).read_only(),
            FieldSpec::new("num_views", "Número de visualizações", FieldKind::Integer)
                .read_only(),
            FieldSpec::new("tags", "Tags", FieldKind::ManyToMany)
                .optional()
                .related("tag"),
        ],
    }
}

pub fn tag_model() -> ModelSpec {
    ModelSpec {
        name: "tag",
        verbose_name: "tag",
        verbose_name_plural: "tags",
        display_field: "name",
        fields: vec![
            FieldSpec::new("id", "ID", FieldKind::Integer).read_only(),
            FieldSpec::new("name", "Nome", FieldKind::Char)
                .unique()
                .max_length(tag::NAME_MAX_LEN),
        ],
    }
}

pub fn admin_schema() -> AdminSchemaResponse {
    AdminSchemaResponse {
        models: vec![video_model(), tag_model()],
    }
}

/// Returns the canonical name if `field` is one of the video's read-only fields.
pub fn video_read_only_field(field: &str) -> Option<&'static str> {
    VIDEO_READ_ONLY_FIELDS.iter().copied().find(|f| *f == field)
}
