use anyhow::{Context, Result, anyhow, bail};
use catalog::{CatalogIndex, Film};
use clap::{Parser, Subcommand};
use colored::Colorize;
use engagement::{
    Catalog, DirectorId, EventType, FeedEvent, FilmId, GenreId, Operation, Polarity, ReviewId,
    UserId, VoteState,
};
use serde::Serialize;
use service::{EngagementService, ServiceConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Cinegraph - likes, reviews and recommendations over a film catalog
#[derive(Parser)]
#[command(name = "cinegraph")]
#[command(about = "Film popularity, recommendations and review usefulness", long_about = None)]
struct Cli {
    /// Path to the dataset directory
    #[arg(short, long, default_value = "data/sample")]
    data_dir: PathBuf,

    /// Optional JSON service configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Most liked films, optionally by genre and release year
    Popular {
        /// Number of films to return
        #[arg(long, allow_negative_numbers = true)]
        limit: Option<i64>,

        /// Genre name or id
        #[arg(long)]
        genre: Option<String>,

        /// Release year
        #[arg(long)]
        year: Option<u16>,
    },

    /// Film recommendations for a user
    Recommend {
        #[arg(long)]
        user_id: UserId,
    },

    /// Films of a director, by release year or by likes
    Director {
        #[arg(long)]
        director_id: DirectorId,

        /// year or likes
        #[arg(long, default_value = "year")]
        sort_by: String,
    },

    /// Search films by title and/or director name, most liked first
    Search {
        query: String,

        /// Comma separated fields to search: title, director
        #[arg(long)]
        by: Option<String>,
    },

    /// Show a user's profile and liked films
    User {
        #[arg(long)]
        user_id: UserId,
    },

    /// Show a user's activity feed
    Feed {
        #[arg(long)]
        user_id: UserId,
    },

    /// Most useful reviews, of one film or of all
    Reviews {
        #[arg(long)]
        film_id: Option<FilmId>,

        /// Number of reviews to return
        #[arg(long, allow_negative_numbers = true)]
        count: Option<i64>,
    },

    /// Films two users both like
    Common {
        #[arg(long)]
        user_id: UserId,

        #[arg(long)]
        other_id: UserId,
    },

    /// Like (or with --remove, unlike) a film, then show the user's feed
    Like {
        #[arg(long)]
        user_id: UserId,

        #[arg(long)]
        film_id: FilmId,

        #[arg(long)]
        remove: bool,
    },

    /// Befriend (or with --remove, unfriend) a user, then show the user's feed
    Friend {
        #[arg(long)]
        user_id: UserId,

        #[arg(long)]
        friend_id: UserId,

        #[arg(long)]
        remove: bool,
    },

    /// Vote on a review (or with --retract, take the vote back)
    Vote {
        #[arg(long)]
        review_id: ReviewId,

        #[arg(long)]
        user_id: UserId,

        /// like or dislike
        #[arg(long, value_parser = parse_polarity)]
        polarity: Polarity,

        #[arg(long)]
        retract: bool,
    },

    /// Run concurrent recommendations and votes, then check score consistency
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

fn parse_polarity(s: &str) -> std::result::Result<Polarity, String> {
    catalog::parser::parse_polarity(s).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ServiceConfig::from_json_file(path)?,
        None => ServiceConfig::default(),
    };

    // Load the catalog and replay persisted engagement
    let start = Instant::now();
    let (catalog, snapshot) = CatalogIndex::load_from_files(&cli.data_dir)
        .with_context(|| format!("Failed to load dataset from {}", cli.data_dir.display()))?;
    let catalog = Arc::new(catalog);
    let service = EngagementService::new(catalog.clone(), config);
    service
        .seed(&snapshot)
        .context("Failed to seed engagement state")?;
    info!("Loaded dataset in {:?}", start.elapsed());

    let app = App {
        catalog,
        service,
        json: cli.json,
    };

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Popular { limit, genre, year } => app.handle_popular(limit, genre, year).await?,
        Commands::Recommend { user_id } => app.handle_recommend(user_id).await?,
        Commands::Director {
            director_id,
            sort_by,
        } => app.handle_director(director_id, &sort_by)?,
        Commands::Search { query, by } => app.handle_search(&query, by.as_deref())?,
        Commands::User { user_id } => app.handle_user(user_id)?,
        Commands::Feed { user_id } => app.handle_feed(user_id)?,
        Commands::Reviews { film_id, count } => app.handle_reviews(film_id, count)?,
        Commands::Common { user_id, other_id } => app.handle_common(user_id, other_id)?,
        Commands::Like {
            user_id,
            film_id,
            remove,
        } => app.handle_like(user_id, film_id, remove)?,
        Commands::Friend {
            user_id,
            friend_id,
            remove,
        } => app.handle_friend(user_id, friend_id, remove)?,
        Commands::Vote {
            review_id,
            user_id,
            polarity,
            retract,
        } => app.handle_vote(review_id, user_id, polarity, retract)?,
        Commands::Benchmark {
            requests,
            concurrent,
        } => app.handle_benchmark(requests, concurrent).await?,
    }

    Ok(())
}

struct App {
    catalog: Arc<CatalogIndex>,
    service: EngagementService,
    json: bool,
}

#[derive(Serialize)]
struct UserProfile<'a> {
    id: UserId,
    login: &'a str,
    name: &'a str,
    liked_films: Vec<&'a Film>,
}

#[derive(Serialize)]
struct RankedReview<'a> {
    review_id: ReviewId,
    film_id: FilmId,
    author_id: UserId,
    is_positive: bool,
    content: &'a str,
    score: i64,
}

#[derive(Serialize)]
struct VoteOutcome {
    review_id: ReviewId,
    user_id: UserId,
    score: i64,
    vote: VoteState,
}

impl App {
    /// Handle the 'popular' command
    async fn handle_popular(
        &self,
        limit: Option<i64>,
        genre: Option<String>,
        year: Option<u16>,
    ) -> Result<()> {
        let genre_id = genre.map(|g| self.resolve_genre(&g)).transpose()?;
        let films = self.service.popular_films(limit, genre_id, year).await?;

        self.emit(&films, || {
            println!("{}", "Popular Films:".bold().blue());
            for (rank, film) in films.iter().enumerate() {
                println!(
                    "{}. {} - {} likes",
                    (rank + 1).to_string().green(),
                    self.describe_film(film),
                    self.service.film_like_count(film.id)
                );
            }
        })
    }

    /// Handle the 'recommend' command
    async fn handle_recommend(&self, user_id: UserId) -> Result<()> {
        let films = self.service.recommended_films(user_id).await?;

        self.emit(&films, || {
            println!(
                "{}",
                format!("Recommendations for user {}:", user_id).bold().blue()
            );
            if films.is_empty() {
                println!("  (none: the user shares no liked film with anyone)");
            }
            for (rank, film) in films.iter().enumerate() {
                println!(
                    "{}. {}",
                    (rank + 1).to_string().green(),
                    self.describe_film(film)
                );
            }
        })
    }

    /// Handle the 'director' command
    fn handle_director(&self, director_id: DirectorId, sort_by: &str) -> Result<()> {
        let films = self.service.director_films(director_id, Some(sort_by))?;
        let name = self
            .catalog
            .get_director(director_id)
            .map_or("", |director| director.name.as_str());

        self.emit(&films, || {
            println!(
                "{}",
                format!("Films of {} (by {}):", name, sort_by).bold().blue()
            );
            for film in &films {
                println!(
                    "  - {} - {} likes",
                    self.describe_film(film),
                    self.service.film_like_count(film.id)
                );
            }
        })
    }

    /// Handle the 'search' command
    fn handle_search(&self, query: &str, by: Option<&str>) -> Result<()> {
        let films = self.service.search_films(query, by)?;

        self.emit(&films, || {
            println!("{}", format!("Results for \"{}\":", query).bold().blue());
            if films.is_empty() {
                println!("  (no match)");
            }
            for (rank, film) in films.iter().enumerate() {
                println!(
                    "{}. {} - {} likes",
                    (rank + 1).to_string().green(),
                    self.describe_film(film),
                    self.service.film_like_count(film.id)
                );
            }
        })
    }

    /// Handle the 'user' command
    fn handle_user(&self, user_id: UserId) -> Result<()> {
        let user = self
            .catalog
            .get_user(user_id)
            .ok_or_else(|| anyhow!("User {} not found", user_id))?;
        let liked = self.service.films_liked_by(user_id)?;

        let profile = UserProfile {
            id: user.id,
            login: &user.login,
            name: &user.name,
            liked_films: liked
                .iter()
                .filter_map(|id| self.catalog.get_film(*id))
                .collect(),
        };

        self.emit(&profile, || {
            println!("{}", format!("User {}", user_id).bold().blue());
            println!("{}Login: {}", "• ".green(), profile.login);
            println!("{}Name: {}", "• ".green(), profile.name);
            println!("{}Liked films: {}", "• ".cyan(), profile.liked_films.len());
            for film in &profile.liked_films {
                println!("  - {}", self.describe_film(film));
            }
        })
    }

    /// Handle the 'feed' command
    fn handle_feed(&self, user_id: UserId) -> Result<()> {
        let feed = self.service.feed_for(user_id)?;
        self.emit(&feed, || print_feed(user_id, &feed))
    }

    /// Handle the 'reviews' command
    fn handle_reviews(&self, film_id: Option<FilmId>, count: Option<i64>) -> Result<()> {
        let ranked = self.service.most_useful_reviews(film_id, count)?;
        let reviews: Vec<RankedReview<'_>> = ranked
            .iter()
            .filter_map(|&(review_id, score)| {
                self.catalog.get_review(review_id).map(|review| RankedReview {
                    review_id,
                    film_id: review.film_id,
                    author_id: review.user_id,
                    is_positive: review.is_positive,
                    content: &review.content,
                    score,
                })
            })
            .collect();

        self.emit(&reviews, || {
            println!("{}", "Most Useful Reviews:".bold().blue());
            for (rank, review) in reviews.iter().enumerate() {
                let tone = if review.is_positive {
                    "positive".green()
                } else {
                    "negative".red()
                };
                println!(
                    "{}. review {} of film {} by user {} ({}) - usefulness {}",
                    (rank + 1).to_string().green(),
                    review.review_id,
                    review.film_id,
                    review.author_id,
                    tone,
                    review.score
                );
                println!("   {}", review.content);
            }
        })
    }

    /// Handle the 'common' command
    fn handle_common(&self, user_id: UserId, other_id: UserId) -> Result<()> {
        let ids = self.service.common_films(user_id, other_id)?;
        let films = self.catalog.film_records(&ids);

        self.emit(&films, || {
            println!(
                "{}",
                format!("Films liked by both {} and {}:", user_id, other_id)
                    .bold()
                    .blue()
            );
            for film in &films {
                println!("  - {}", self.describe_film(film));
            }
        })
    }

    /// Handle the 'like' command
    fn handle_like(&self, user_id: UserId, film_id: FilmId, remove: bool) -> Result<()> {
        if remove {
            self.service.remove_like(user_id, film_id)?;
        } else {
            self.service.add_like(user_id, film_id)?;
        }
        self.handle_feed(user_id)
    }

    /// Handle the 'friend' command
    fn handle_friend(&self, user_id: UserId, friend_id: UserId, remove: bool) -> Result<()> {
        let operation = if remove {
            Operation::Remove
        } else {
            Operation::Add
        };
        self.service
            .record_friendship(user_id, friend_id, operation)?;
        self.handle_feed(user_id)
    }

    /// Handle the 'vote' command
    fn handle_vote(
        &self,
        review_id: ReviewId,
        user_id: UserId,
        polarity: Polarity,
        retract: bool,
    ) -> Result<()> {
        let score = if retract {
            self.service.retract_vote(review_id, user_id, polarity)?
        } else {
            self.service.vote(review_id, user_id, polarity)?
        };
        let outcome = VoteOutcome {
            review_id,
            user_id,
            score,
            vote: self.service.vote_of(review_id, user_id)?,
        };

        self.emit(&outcome, || {
            println!(
                "{} Review {} now scores {} (user {}: {:?})",
                "✓".green(),
                review_id,
                score,
                user_id,
                outcome.vote
            );
        })
    }

    /// Handle the 'benchmark' command
    async fn handle_benchmark(&self, requests: usize, concurrent: usize) -> Result<()> {
        let users = self.catalog.all_user_ids();
        if users.is_empty() || requests == 0 {
            bail!("Benchmark needs at least one user and one request");
        }
        let concurrent = concurrent.max(1);

        // Recommendation latency under concurrent load
        let user_ids: Vec<UserId> = (0..requests)
            .map(|_| users[rand::random::<u32>() as usize % users.len()])
            .collect();

        let wall_clock = Instant::now();
        let mut timings: Vec<Duration> = Vec::with_capacity(requests);
        for batch in user_ids.chunks(concurrent) {
            let handles: Vec<_> = batch
                .iter()
                .map(|&user_id| {
                    let service = self.service.clone();
                    tokio::spawn(async move {
                        let start = Instant::now();
                        service.recommend(user_id).await?;
                        Ok::<_, anyhow::Error>(start.elapsed())
                    })
                })
                .collect();
            for handle in handles {
                timings.push(handle.await??);
            }
        }
        let total_time = wall_clock.elapsed();

        timings.sort();
        let total_latency: Duration = timings.iter().sum();
        let avg_latency = total_latency / (timings.len() as u32);
        let percentile = |p: f32| timings[((timings.len() as f32 * p) as usize).min(timings.len() - 1)];
        let throughput = requests as f32 / total_time.as_secs_f32();

        println!("{}", "Benchmark results:".bold().blue());
        println!("Total time: {:?}", total_time);
        println!("Average latency: {:?}", avg_latency);
        println!("P50 latency: {:?}", percentile(0.50));
        println!("P95 latency: {:?}", percentile(0.95));
        println!("P99 latency: {:?}", percentile(0.99));
        println!("Throughput: {:.2} requests/second", throughput);

        // Concurrent votes on one review must leave a consistent score
        let Some(&review_id) = self.catalog.reviews(None).iter().min() else {
            println!("No reviews to vote on, skipping vote consistency check");
            return Ok(());
        };
        let voters: Vec<UserId> = users.iter().copied().take(concurrent).collect();
        let handles: Vec<_> = voters
            .iter()
            .map(|&user_id| {
                let service = self.service.clone();
                tokio::spawn(async move {
                    for _ in 0..requests {
                        let polarity = if rand::random::<bool>() {
                            Polarity::Like
                        } else {
                            Polarity::Dislike
                        };
                        service.vote(review_id, user_id, polarity)?;
                    }
                    Ok::<_, anyhow::Error>(())
                })
            })
            .collect();
        for handle in handles {
            handle.await??;
        }

        let mut expected = 0i64;
        for &user_id in &users {
            expected += match self.service.vote_of(review_id, user_id)? {
                VoteState::Liked => 1,
                VoteState::Disliked => -1,
                VoteState::NoVote => 0,
            };
        }
        let score = self.service.score_of(review_id)?;
        if score != expected {
            bail!(
                "Review {} scores {} but its votes add up to {}",
                review_id,
                score,
                expected
            );
        }
        println!(
            "{} {} voters x {} votes on review {}: score {} matches the votes",
            "✓".green(),
            voters.len(),
            requests,
            review_id,
            score
        );

        Ok(())
    }

    /// Accept a genre by id or by (case-insensitive) name
    fn resolve_genre(&self, genre: &str) -> Result<GenreId> {
        if let Ok(id) = genre.parse::<GenreId>() {
            return Ok(id);
        }
        self.catalog
            .find_genre(genre)
            .map(|g| g.id)
            .ok_or_else(|| anyhow!("Unknown genre: {}", genre))
    }

    fn describe_film(&self, film: &Film) -> String {
        let directors = self.catalog.director_names(film);
        let by = if directors.is_empty() {
            String::new()
        } else {
            format!(" by {}", directors.join(", "))
        };
        format!(
            "{} ({}){} [{}]",
            film.title,
            film.release_year,
            by,
            self.catalog.genre_names(film).join(", ")
        )
    }

    /// Print `value` as JSON, or run the human-readable printer
    fn emit<T: Serialize>(&self, value: &T, print: impl FnOnce()) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            print();
        }
        Ok(())
    }
}

/// Helper function to format and print a feed
fn print_feed(user_id: UserId, feed: &[FeedEvent]) {
    println!("{}", format!("Feed of user {}:", user_id).bold().blue());
    if feed.is_empty() {
        println!("  (no activity)");
    }
    for event in feed {
        let what = match event.event_type {
            EventType::Like => format!("film {}", event.entity_id),
            EventType::Review => format!("review {}", event.entity_id),
            EventType::Friend => format!("friend {}", event.entity_id),
        };
        let operation = match event.operation {
            Operation::Add => "ADD".green(),
            Operation::Remove => "REMOVE".red(),
            Operation::Update => "UPDATE".yellow(),
        };
        println!(
            "  #{} {} {:?} {} {}",
            event.event_id,
            event.timestamp.format("%Y-%m-%d %H:%M:%S"),
            event.event_type,
            operation,
            what
        );
    }
}
