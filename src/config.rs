use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    /// Checked only when set; the auth platform puts its project URL here.
    pub issuer: Option<String>,
    pub audience: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub recipes_dir: String,
    pub images_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceCatalog {
    pub basic: String,
    pub standard: String,
    pub premium: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    pub secret_key: String,
    pub webhook_secret: String,
    pub api_base: String,
    pub prices: PriceCatalog,
    /// Public origin of the web client; checkout and portal redirect back here.
    pub app_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub catalog: CatalogConfig,
    pub billing: BillingConfig,
    pub llm: LlmConfig,
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn required(key: &str) -> anyhow::Result<String> {
    std::env::var(key).map_err(|_| anyhow::anyhow!("missing environment variable {key}"))
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = required("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: required("AUTH_JWT_SECRET")?,
            issuer: std::env::var("AUTH_JWT_ISSUER").ok().filter(|v| !v.is_empty()),
            audience: var_or("AUTH_JWT_AUDIENCE", "authenticated"),
        };
        let catalog = CatalogConfig {
            recipes_dir: var_or("RECIPES_DIR", "data/recipes"),
            images_dir: var_or("IMAGES_DIR", "static/images"),
        };
        let billing = BillingConfig {
            secret_key: required("STRIPE_SECRET_KEY")?,
            webhook_secret: required("STRIPE_WEBHOOK_SECRET")?,
            api_base: var_or("STRIPE_API_BASE", "https://api.stripe.com"),
            prices: PriceCatalog {
                basic: required("STRIPE_PRICE_BASIC")?,
                standard: required("STRIPE_PRICE_STANDARD")?,
                premium: required("STRIPE_PRICE_PREMIUM")?,
            },
            app_base_url: var_or("APP_BASE_URL", "http://localhost:3000"),
        };
        let llm = LlmConfig {
            api_key: required("LLM_API_KEY")?,
            api_base: var_or("LLM_API_BASE", "https://api.openai.com/v1"),
            model: var_or("LLM_MODEL", "gpt-4o-mini"),
        };
        Ok(Self {
            database_url,
            jwt,
            catalog,
            billing,
            llm,
        })
    }
}
