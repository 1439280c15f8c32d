#![deny(missing_docs)]

/*!
The `ArrayLinkedList` data structure is a doubly linked list packed into arrays that are allocated once.
Every supported operation is done in *O*(1) and never allocates:
* inserting elements at the front
* inserting elements after an element identified by its index
* getting the previous and next index of an element
* removing elements at an arbitrary index
* getting the element count
The storage is made of three parallel arrays of the same length, the capacity:
* the elements themselves, each slot either holding a value or being empty
* the index of the previous element of every slot
* the index of the next element of every slot
The slots, which are currently empty, are kept on a stack of free indices.
Inserting pops an index from that stack, removing pushes the index back.
# Order and indexing
There is a logical order, which is used when walking from the first element along the next indices.
And then there is indexing, which has nothing to do with the order of the linked list.
An index returned by an insertion stays valid until that element is removed, independent of
what happens to other elements.
## Index example
On a fresh list, indices are handed out in a raising order, starting with zero.
The most recently freed index is the next one handed out again.
```
use slotlist_arena::ArrayLinkedList;
let mut list = ArrayLinkedList::with_capacity(8).unwrap();
assert_eq!(list.insert_first(1).unwrap(), 0);
assert_eq!(list.insert_first(2).unwrap(), 1);
assert_eq!(list.insert_after(0, 3).unwrap(), 2);
assert_eq!(list.remove(1).unwrap(), 2);
assert_eq!(list.insert_first(4).unwrap(), 1);
```
## Traversal example
```
use slotlist_arena::ArrayLinkedList;
let mut list = ArrayLinkedList::with_capacity(8).unwrap();
let first = list.insert_first(1).unwrap();
let second = list.insert_after(first, 2).unwrap();
list.insert_after(second, 3).unwrap();

let mut values = Vec::new();
let mut cursor = Some(list.get_first().unwrap());
while let Some(index) = cursor {
    values.push(*list.get(index).unwrap());
    cursor = list.get_next(index).unwrap();
}
assert_eq!(values, vec![1, 2, 3]);
assert_eq!(list.iter().copied().collect::<Vec<_>>(), values);
```
## Conclusion
Just remember, that indices and order are two different things, which don't correlate, and you should be safe.
**/

use std::mem;

use slotlist_libs::serde::{self, Deserialize, Serialize};
use slotlist_libs::tracing;
use speedy::{Endianness, Readable, Writable};

use crate::ArrayLinkedListError;

/// Link words store `index + 1`, so that `0` means there is no neighbor.
#[inline]
fn link(index: u32) -> u32 {
    index + 1
}

#[inline]
fn unlink(link: u32) -> Option<u32> {
    if link > 0 {
        Some(link - 1)
    } else {
        None
    }
}

/// The `ArrayLinkedList` type, a doubly linked list with a fixed number of slots.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Readable, Writable)]
#[serde(crate = "self::serde")]
pub struct ArrayLinkedList<T> {
    count: u32,
    first_index: u32,
    elements: Vec<Option<T>>,
    prev_indices: Vec<u32>,
    next_indices: Vec<u32>,
    free_indices: Vec<u32>,
}

impl<T> ArrayLinkedList<T> {
    /// Constructs a new, empty `ArrayLinkedList<T>` with exactly `capacity` slots.
    ///
    /// All storage is allocated here, later operations never reallocate.
    ///
    /// # Errors
    /// Returns `InvalidCapacity` if `capacity` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use slotlist_arena::{ArrayLinkedList, ArrayLinkedListError};
    ///
    /// let list = ArrayLinkedList::<u64>::with_capacity(10).unwrap();
    /// assert_eq!(list.capacity(), 10);
    /// assert!(list.is_empty());
    ///
    /// assert_eq!(
    ///     ArrayLinkedList::<u64>::with_capacity(0).unwrap_err(),
    ///     ArrayLinkedListError::InvalidCapacity(0)
    /// );
    /// ```
    pub fn with_capacity(capacity: u32) -> Result<Self, ArrayLinkedListError> {
        if capacity == 0 {
            return Err(ArrayLinkedListError::InvalidCapacity(capacity));
        }
        let mut result = Self {
            count: 0,
            first_index: 0,
            elements: Vec::with_capacity(capacity as usize),
            prev_indices: Vec::with_capacity(capacity as usize),
            next_indices: Vec::with_capacity(capacity as usize),
            free_indices: Vec::with_capacity(capacity as usize),
        };
        result.fill_elements(capacity);
        Ok(result)
    }

    #[inline]
    fn fill_elements(&mut self, capacity: u32) {
        self.elements.resize_with(capacity as usize, || None);
        self.prev_indices.resize(capacity as usize, 0);
        self.next_indices.resize(capacity as usize, 0);
        self.fill_free_indices(capacity);
    }

    // The top of the stack is slot 0, so a fresh list hands out 0, 1, 2, ...
    #[inline]
    fn fill_free_indices(&mut self, capacity: u32) {
        self.free_indices.clear();
        self.free_indices.extend((0..capacity).rev());
    }

    #[inline]
    fn check_range(&self, index: u32) -> Result<usize, ArrayLinkedListError> {
        let capacity = self.capacity();
        if index < capacity {
            Ok(index as usize)
        } else {
            Err(ArrayLinkedListError::OutOfRange { index, capacity })
        }
    }

    #[inline]
    fn check_occupied(&self, index: u32) -> Result<usize, ArrayLinkedListError> {
        let slot = self.check_range(index)?;
        if self.elements[slot].is_some() {
            Ok(slot)
        } else {
            Err(ArrayLinkedListError::EmptySlot(index))
        }
    }

    fn claim_free_index(&mut self) -> Result<u32, ArrayLinkedListError> {
        match self.free_indices.pop() {
            Some(index) => Ok(index),
            None => {
                tracing::warn!(
                    "array linked list is full, capacity = {}",
                    self.elements.len()
                );
                Err(ArrayLinkedListError::Full(self.capacity()))
            }
        }
    }

    #[inline]
    fn set_entry(&mut self, index: u32, prev_link: u32, value: T, next_link: u32) {
        let slot = index as usize;
        self.prev_indices[slot] = prev_link;
        self.elements[slot] = Some(value);
        self.next_indices[slot] = next_link;
    }

    #[inline]
    fn next_of_prev(&mut self, prev_link: u32) -> &mut u32 {
        match unlink(prev_link) {
            Some(prev_index) => &mut self.next_indices[prev_index as usize],
            None => &mut self.first_index,
        }
    }

    #[inline]
    fn prev_of_next(&mut self, next_link: u32) -> Option<&mut u32> {
        match unlink(next_link) {
            Some(next_index) => Some(&mut self.prev_indices[next_index as usize]),
            None => None,
        }
    }

    fn connect_indices(&mut self, prev_link: u32, next_link: u32) {
        *self.next_of_prev(prev_link) = next_link;
        if let Some(prev_of_next) = self.prev_of_next(next_link) {
            *prev_of_next = prev_link;
        }
    }

    /// Adds an element at the front of the list and returns its index.
    ///
    /// This operation should compute in *O*(1) time.
    ///
    /// # Errors
    /// Returns `Full` if every slot is already occupied.
    ///
    /// # Examples
    ///
    /// ```
    /// use slotlist_arena::ArrayLinkedList;
    ///
    /// let mut list = ArrayLinkedList::with_capacity(2).unwrap();
    ///
    /// let second = list.insert_first(2).unwrap();
    /// let first = list.insert_first(1).unwrap();
    /// assert_eq!(list.get_first().unwrap(), first);
    /// assert_eq!(list.get_next(first).unwrap(), Some(second));
    /// assert!(list.insert_first(0).is_err());
    /// ```
    pub fn insert_first(&mut self, value: T) -> Result<u32, ArrayLinkedListError> {
        let index = self.claim_free_index()?;
        let next_link = self.first_index;

        self.set_entry(index, 0, value, next_link);
        if let Some(prev_of_next) = self.prev_of_next(next_link) {
            *prev_of_next = link(index);
        }

        self.first_index = link(index);
        self.count += 1;

        tracing::trace!("inserted slot {} at the front", index);
        Ok(index)
    }

    /// Inserts an element right after the element at `prev_index` and returns its index.
    ///
    /// The first element never changes here: inserting after the current first element
    /// places the new element second.
    ///
    /// # Errors
    /// Returns `OutOfRange` if `prev_index >= capacity`, `EmptySlot` if no element is
    /// stored at `prev_index`, and `Full` if every slot is already occupied.
    ///
    /// # Examples
    ///
    /// ```
    /// use slotlist_arena::ArrayLinkedList;
    ///
    /// let mut list = ArrayLinkedList::with_capacity(4).unwrap();
    ///
    /// let first = list.insert_first(1).unwrap();
    /// let third = list.insert_after(first, 3).unwrap();
    /// let second = list.insert_after(first, 2).unwrap();
    ///
    /// assert_eq!(list.get_first().unwrap(), first);
    /// assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    /// assert_eq!(list.get_previous(third).unwrap(), Some(second));
    /// ```
    pub fn insert_after(&mut self, prev_index: u32, value: T) -> Result<u32, ArrayLinkedListError> {
        let prev_slot = self.check_occupied(prev_index)?;
        let index = self.claim_free_index()?;
        let next_link = self.next_indices[prev_slot];

        self.set_entry(index, link(prev_index), value, next_link);
        self.next_indices[prev_slot] = link(index);
        if let Some(prev_of_next) = self.prev_of_next(next_link) {
            *prev_of_next = link(index);
        }

        self.count += 1;

        tracing::trace!("inserted slot {} after slot {}", index, prev_index);
        Ok(index)
    }

    /// The index of the element following the one at `index`, or `None` if it is the last.
    ///
    /// # Errors
    /// Returns `OutOfRange` if `index >= capacity` and `EmptySlot` if no element is stored there.
    pub fn get_next(&self, index: u32) -> Result<Option<u32>, ArrayLinkedListError> {
        let slot = self.check_occupied(index)?;
        Ok(unlink(self.next_indices[slot]))
    }

    /// The index of the element preceding the one at `index`, or `None` if it is the first.
    ///
    /// # Errors
    /// Returns `OutOfRange` if `index >= capacity` and `EmptySlot` if no element is stored there.
    pub fn get_previous(&self, index: u32) -> Result<Option<u32>, ArrayLinkedListError> {
        let slot = self.check_occupied(index)?;
        Ok(unlink(self.prev_indices[slot]))
    }

    /// The index of the first list element.
    ///
    /// # Errors
    /// Returns `EmptyList` if the list holds no element.
    pub fn get_first(&self) -> Result<u32, ArrayLinkedListError> {
        unlink(self.first_index).ok_or(ArrayLinkedListError::EmptyList)
    }

    /// The element stored at `index`.
    ///
    /// # Errors
    /// Returns `OutOfRange` if `index >= capacity` and `EmptySlot` if no element is stored there.
    pub fn get(&self, index: u32) -> Result<&T, ArrayLinkedListError> {
        let slot = self.check_range(index)?;
        self.elements[slot]
            .as_ref()
            .ok_or(ArrayLinkedListError::EmptySlot(index))
    }

    /// The element stored at `index` as a mutable reference.
    ///
    /// # Errors
    /// Returns `OutOfRange` if `index >= capacity` and `EmptySlot` if no element is stored there.
    pub fn get_mut(&mut self, index: u32) -> Result<&mut T, ArrayLinkedListError> {
        let slot = self.check_range(index)?;
        self.elements[slot]
            .as_mut()
            .ok_or(ArrayLinkedListError::EmptySlot(index))
    }

    /// Checks if an element is stored at `index`. Out of range indices are simply not contained.
    pub fn contains(&self, index: u32) -> bool {
        self.check_occupied(index).is_ok()
    }

    /// Removes the element at the given index and returns it.
    /// The indices of other elements are not changed, and the order of the rest is preserved.
    /// The freed index is the next one handed out by an insertion.
    ///
    /// This operation should compute in *O*(1) time.
    ///
    /// # Errors
    /// Returns `OutOfRange` if `index >= capacity` and `EmptySlot` if no element is stored there.
    ///
    /// # Examples
    ///
    /// ```
    /// use slotlist_arena::{ArrayLinkedList, ArrayLinkedListError};
    ///
    /// let mut list = ArrayLinkedList::with_capacity(4).unwrap();
    ///
    /// let first = list.insert_first(1).unwrap();
    /// let second = list.insert_after(first, 2).unwrap();
    /// assert_eq!(list.len(), 2);
    ///
    /// assert_eq!(list.remove(first).unwrap(), 1);
    /// assert_eq!(list.get_first().unwrap(), second);
    /// assert_eq!(list.remove(first), Err(ArrayLinkedListError::EmptySlot(first)));
    ///
    /// assert_eq!(list.remove(second).unwrap(), 2);
    /// assert!(list.is_empty());
    /// assert_eq!(list.get_first(), Err(ArrayLinkedListError::EmptyList));
    /// ```
    pub fn remove(&mut self, index: u32) -> Result<T, ArrayLinkedListError> {
        let slot = self.check_range(index)?;
        let value = self.elements[slot]
            .take()
            .ok_or(ArrayLinkedListError::EmptySlot(index))?;

        let prev_link = mem::replace(&mut self.prev_indices[slot], 0);
        let next_link = mem::replace(&mut self.next_indices[slot], 0);
        self.connect_indices(prev_link, next_link);

        self.free_indices.push(index);
        self.count -= 1;

        tracing::trace!("removed slot {}", index);
        Ok(value)
    }

    /// Clears the list, removing all values.
    ///
    /// The capacity is kept, and indices are handed out from zero again.
    pub fn clear(&mut self) {
        self.elements.iter_mut().for_each(|element| *element = None);
        self.prev_indices.iter_mut().for_each(|prev| *prev = 0);
        self.next_indices.iter_mut().for_each(|next| *next = 0);
        self.first_index = 0;
        self.count = 0;

        let capacity = self.capacity();
        self.fill_free_indices(capacity);
    }

    /// Returns the number of elements in the list.
    pub fn len(&self) -> u32 {
        self.count
    }

    /// Checks if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns the number of slots, fixed at construction.
    ///
    /// Methods, which take indices, require the specified index to be below the capacity.
    pub fn capacity(&self) -> u32 {
        self.elements.len() as _
    }

    /// Returns the number of slots still available for insertion.
    pub fn free_len(&self) -> u32 {
        self.free_indices.len() as _
    }

    /// Checks if every slot is occupied.
    pub fn is_full(&self) -> bool {
        self.free_indices.is_empty()
    }

    /// Returns a borrowing iterator over its elements, from the first along the next indices.
    pub fn iter<'a>(&'a self) -> impl Iterator<Item = &'a T> {
        Values(Indexed::new(self))
    }

    /// Returns a borrowing iterator over its indexed elements, from the first along the next indices.
    pub fn indexed<'a>(&'a self) -> impl Iterator<Item = (u32, &'a T)> {
        Indexed::new(self)
    }

    /// Returns a borrowing iterator over its indices, from the first along the next indices.
    pub fn indices<'a>(&'a self) -> impl Iterator<Item = u32> + 'a {
        Indices(Indexed::new(self))
    }

    /// Verifies that the slots, the links and the free indices agree with each other.
    ///
    /// This walks every slot and is meant for tests and for checking decoded snapshots,
    /// a list only mutated through its methods always passes.
    ///
    /// # Errors
    /// Returns `Corrupted` describing the first inconsistency found.
    pub fn check_integrity(&self) -> Result<(), ArrayLinkedListError> {
        let capacity = self.elements.len();
        if capacity == 0 {
            return Err(corrupted("no slots allocated".to_string()));
        }
        if self.prev_indices.len() != capacity || self.next_indices.len() != capacity {
            return Err(corrupted(format!(
                "link arrays of length {}/{} for {} slots",
                self.prev_indices.len(),
                self.next_indices.len(),
                capacity
            )));
        }

        let occupied = self.elements.iter().filter(|e| e.is_some()).count();
        if occupied != self.count as usize {
            return Err(corrupted(format!(
                "count is {} but {} slots are occupied",
                self.count, occupied
            )));
        }
        if occupied + self.free_indices.len() != capacity {
            return Err(corrupted(format!(
                "{} occupied and {} free slots do not add up to capacity {}",
                occupied,
                self.free_indices.len(),
                capacity
            )));
        }

        let mut seen = vec![false; capacity];
        for &free_index in self.free_indices.iter() {
            let slot = free_index as usize;
            if slot >= capacity {
                return Err(corrupted(format!("free index {} out of range", free_index)));
            }
            if seen[slot] {
                return Err(corrupted(format!("free index {} listed twice", free_index)));
            }
            if self.elements[slot].is_some() {
                return Err(corrupted(format!("free index {} is occupied", free_index)));
            }
            seen[slot] = true;
        }

        let mut visited = vec![false; capacity];
        let mut steps = 0u32;
        let mut prev_link = 0;
        let mut cursor = self.first_index;
        while let Some(index) = unlink(cursor) {
            let slot = index as usize;
            if slot >= capacity || self.elements[slot].is_none() {
                return Err(corrupted(format!("link to unoccupied slot {}", index)));
            }
            if visited[slot] {
                return Err(corrupted(format!("slot {} reached twice", index)));
            }
            if self.prev_indices[slot] != prev_link {
                return Err(corrupted(format!(
                    "slot {} does not link back to its predecessor",
                    index
                )));
            }
            visited[slot] = true;
            steps += 1;
            prev_link = link(index);
            cursor = self.next_indices[slot];
        }
        if steps != self.count {
            return Err(corrupted(format!(
                "traversal visited {} of {} elements",
                steps, self.count
            )));
        }

        Ok(())
    }
}

fn corrupted(reason: String) -> ArrayLinkedListError {
    ArrayLinkedListError::Corrupted(reason)
}

impl<T> ArrayLinkedList<T>
where
    T: Writable<Endianness>,
{
    /// Encodes the whole list, free slots included, into a little endian snapshot.
    pub fn to_snapshot_bytes(&self) -> Result<Vec<u8>, ArrayLinkedListError> {
        self.write_to_vec_with_ctx(Endianness::LittleEndian)
            .map_err(|e| ArrayLinkedListError::Codec(e.to_string()))
    }
}

impl<'a, T> ArrayLinkedList<T>
where
    T: Readable<'a, Endianness>,
{
    /// Decodes a snapshot written by `to_snapshot_bytes`.
    ///
    /// The decoded list is checked with `check_integrity` before it is handed out.
    pub fn from_snapshot_bytes(bytes: &'a [u8]) -> Result<Self, ArrayLinkedListError> {
        let mut list = Self::read_from_buffer_with_ctx(Endianness::LittleEndian, bytes)
            .map_err(|e| ArrayLinkedListError::Codec(e.to_string()))?;
        if let Err(e) = list.check_integrity() {
            tracing::error!("rejected array linked list snapshot: {}", e);
            return Err(e);
        }
        // The decoded free stack is sized to its length, removals must not grow it.
        let occupied = list.elements.len() - list.free_indices.len();
        list.free_indices.reserve_exact(occupied);
        Ok(list)
    }
}

struct Indexed<'a, T> {
    next_link: u32,
    remaining: u32,
    array: &'a ArrayLinkedList<T>,
}

impl<'a, T> Indexed<'a, T> {
    fn new(array: &'a ArrayLinkedList<T>) -> Self {
        Self {
            next_link: array.first_index,
            remaining: array.count,
            array,
        }
    }
}

struct Indices<'a, T>(Indexed<'a, T>);

/// Borrowing iterator over values of the linked array.
pub struct Values<'a, T>(Indexed<'a, T>);

impl<'a, T> Iterator for Indexed<'a, T> {
    type Item = (u32, &'a T);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let index = unlink(self.next_link)?;
        let slot = index as usize;
        self.next_link = self.array.next_indices[slot];
        self.remaining -= 1;
        self.array.elements[slot]
            .as_ref()
            .map(|value| (index, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining as usize, Some(self.remaining as usize))
    }
}

impl<'a, T> Iterator for Indices<'a, T> {
    type Item = u32;
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(index, _)| index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<'a, T> Iterator for Values<'a, T> {
    type Item = &'a T;
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<'a, T> IntoIterator for &'a ArrayLinkedList<T> {
    type Item = &'a T;
    type IntoIter = Values<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        Values(Indexed::new(self))
    }
}
