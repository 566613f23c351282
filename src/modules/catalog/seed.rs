//! Built-in catalog written on first start.

use super::models::Book;

/// (id, title, author, category, cover image, description)
const SEED: &[(&str, &str, &str, &str, &str, &str)] = &[
    (
        "1",
        "The Design of Everyday Things",
        "Don Norman",
        "Design",
        "https://images.unsplash.com/photo-1544947950-fa07a98d237f?q=80&w=1287&auto=format&fit=crop",
        "A powerful primer on how—and why—some products satisfy customers while others only frustrate them.",
    ),
    (
        "2",
        "Thinking, Fast and Slow",
        "Daniel Kahneman",
        "Psychology",
        "https://images.unsplash.com/photo-1589998059171-988d887df646?q=80&w=1376&auto=format&fit=crop",
        "A groundbreaking tour of the mind and explains the two systems that drive the way we think.",
    ),
    (
        "3",
        "Creativity, Inc.",
        "Ed Catmull",
        "Business",
        "https://images.unsplash.com/photo-1535398089889-dd807df1dfaa?q=80&w=1287&auto=format&fit=crop",
        "A book for managers who want to lead their employees to new heights, and a manual for creativity.",
    ),
    (
        "4",
        "The Lean Startup",
        "Eric Ries",
        "Business",
        "https://images.unsplash.com/photo-1516979187457-637abb4f9353?q=80&w=1470&auto=format&fit=crop",
        "How Today's Entrepreneurs Use Continuous Innovation to Create Radically Successful Businesses.",
    ),
    (
        "5",
        "Sapiens",
        "Yuval Noah Harari",
        "History",
        "https://images.unsplash.com/photo-1629992101753-56d196c8aabb?q=80&w=1290&auto=format&fit=crop",
        "A Brief History of Humankind explores what made homo sapiens the most successful human species.",
    ),
    (
        "6",
        "Dune",
        "Frank Herbert",
        "Science Fiction",
        "https://images.unsplash.com/photo-1606787366850-de6330128bfc?q=80&w=1470&auto=format&fit=crop",
        "Set on the desert planet Arrakis, the story explores themes of politics, religion, and ecology.",
    ),
    (
        "7",
        "1984",
        "George Orwell",
        "Dystopian",
        "https://images.unsplash.com/photo-1541963463532-d68292c34b19?q=80&w=1288&auto=format&fit=crop",
        "A dystopian social science fiction novel that examines the consequences of totalitarianism.",
    ),
    (
        "8",
        "The Alchemist",
        "Paulo Coelho",
        "Fiction",
        "https://images.unsplash.com/photo-1543002588-bfa74002ed7e?q=80&w=1287&auto=format&fit=crop",
        "A philosophical story about a young Andalusian shepherd who travels to Egypt after a recurring dream.",
    ),
];

/// The seed catalog, every book available.
pub fn seed_books() -> Vec<Book> {
    SEED.iter()
        .map(
            |&(id, title, author, category, cover_image, description)| Book {
                id: id.to_string(),
                title: title.to_string(),
                author: author.to_string(),
                category: category.to_string(),
                cover_image: cover_image.to_string(),
                description: description.to_string(),
                available: true,
            },
        )
        .collect()
}
