use sqlx::{sqlite::SqlitePoolOptions, FromRow, SqlitePool};

/// A classified article, as written to and read back from `news_articles`.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ClassifiedArticle {
    pub title: String,
    pub content: String,
    pub publication_date: String,
    pub source_url: String,
    pub category: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

const CREATE_ARTICLES_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS news_articles (
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        publication_date TEXT NOT NULL,
        source_url TEXT NOT NULL,
        category TEXT NOT NULL,
        confidence REAL NOT NULL
    )
"#;

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Every connection to an in-memory database sees its own empty database.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn initialize(&self) -> anyhow::Result<()> {
        sqlx::query(CREATE_ARTICLES_TABLE)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Drop and recreate the table, then fill it with `articles`.
    ///
    /// Runs in a single transaction, so readers see either the previous
    /// contents or the new ones.
    pub async fn replace_articles(&self, articles: &[ClassifiedArticle]) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DROP TABLE IF EXISTS news_articles")
            .execute(&mut *tx)
            .await?;
        sqlx::query(CREATE_ARTICLES_TABLE)
            .execute(&mut *tx)
            .await?;

        for article in articles {
            sqlx::query(
                r#"
                INSERT INTO news_articles
                    (title, content, publication_date, source_url, category, confidence)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&article.title)
            .bind(&article.content)
            .bind(&article.publication_date)
            .bind(&article.source_url)
            .bind(&article.category)
            .bind(article.confidence)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn load_articles(&self) -> anyhow::Result<Vec<ClassifiedArticle>> {
        let articles = sqlx::query_as::<_, ClassifiedArticle>(
            r#"
            SELECT title, content, publication_date, source_url, category, confidence
            FROM news_articles
            ORDER BY rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(articles)
    }

    /// Occurrences of each category, most frequent first.
    pub async fn category_counts(&self) -> anyhow::Result<Vec<CategoryCount>> {
        let counts = sqlx::query_as::<_, CategoryCount>(
            r#"
            SELECT category, COUNT(*) AS count
            FROM news_articles
            GROUP BY category
            ORDER BY count DESC, category ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(counts)
    }
}
