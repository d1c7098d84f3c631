// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory store for actors and movies.
//!
//! Records live in `BTreeMap`s keyed by id, so listings come back ordered
//! by id. Ids are assigned sequentially from 1 and never reused. Nothing is
//! persisted across restarts.

use std::collections::BTreeMap;

use crate::error::ApiError;
use crate::models::{Actor, Movie, UpdateActorRequest, UpdateMovieRequest};

pub struct InMemoryStore {
    actors: BTreeMap<u64, Actor>,
    movies: BTreeMap<u64, Movie>,
    next_actor_id: u64,
    next_movie_id: u64,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self {
            actors: BTreeMap::new(),
            movies: BTreeMap::new(),
            next_actor_id: 1,
            next_movie_id: 1,
        }
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list_actors(&self) -> Vec<Actor> {
        self.actors.values().cloned().collect()
    }

    pub fn has_actor(&self, actor_id: u64) -> bool {
        self.actors.contains_key(&actor_id)
    }

    pub fn create_actor(&mut self, name: String, age: u32, gender: String) -> Actor {
        let id = self.next_actor_id;
        self.next_actor_id += 1;
        let actor = Actor {
            id,
            name,
            age,
            gender,
        };
        self.actors.insert(id, actor.clone());
        actor
    }

    pub fn update_actor(&mut self, actor_id: u64, patch: UpdateActorRequest) -> Result<Actor, ApiError> {
        let actor = self.actors.get_mut(&actor_id).ok_or_else(ApiError::not_found)?;
        if let Some(name) = patch.name {
            actor.name = name;
        }
        if let Some(age) = patch.age {
            actor.age = age;
        }
        if let Some(gender) = patch.gender {
            actor.gender = gender;
        }
        Ok(actor.clone())
    }

    pub fn delete_actor(&mut self, actor_id: u64) -> Result<(), ApiError> {
        self.actors
            .remove(&actor_id)
            .map(|_| ())
            .ok_or_else(ApiError::not_found)
    }

    pub fn list_movies(&self) -> Vec<Movie> {
        self.movies.values().cloned().collect()
    }

    pub fn has_movie(&self, movie_id: u64) -> bool {
        self.movies.contains_key(&movie_id)
    }

    pub fn create_movie(&mut self, title: String, release_date: chrono::NaiveDate) -> Movie {
        let id = self.next_movie_id;
        self.next_movie_id += 1;
        let movie = Movie {
            id,
            title,
            release_date,
        };
        self.movies.insert(id, movie.clone());
        movie
    }

    pub fn update_movie(&mut self, movie_id: u64, patch: UpdateMovieRequest) -> Result<Movie, ApiError> {
        let movie = self.movies.get_mut(&movie_id).ok_or_else(ApiError::not_found)?;
        if let Some(title) = patch.title {
            movie.title = title;
        }
        if let Some(release_date) = patch.release_date {
            movie.release_date = release_date;
        }
        Ok(movie.clone())
    }

    pub fn delete_movie(&mut self, movie_id: u64) -> Result<(), ApiError> {
        self.movies
            .remove(&movie_id)
            .map(|_| ())
            .ok_or_else(ApiError::not_found)
    }
}
